//! CalculiX FRD (result) file reader
//!
//! Reads CalculiX .frd result files into a [`Mesh`] plus per-step result
//! datasets, and serves them through [`ResultRepository`].
//! Based on the FRD format specification from cgx_2.20.pdf Manual, § 11.
//!
//! ## Format Overview
//!
//! FRD files use fixed-width fields:
//! - Node block: `2C` header, `-1` records with node number (I5 or I10) and 3×E12.5 coordinates
//! - Element block: `3C` header, `-1` record with element number and type, `-2` node lines
//! - Result blocks: `100C` header, `-4` dataset, `-5` components, `-1`/`-2` value records
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rt3d_io::FrdFile;
//!
//! let frd = FrdFile::from_file("job.frd")?;
//! println!("Nodes: {}, Elements: {}", frd.mesh.node_count(), frd.mesh.element_count());
//! println!("Result blocks: {}", frd.result_blocks.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rt3d_model::{
    Element, ElementShape, Mesh, Node, Physics, Quantity, ResultField, ResultLocation,
    ResultRepository,
};
use tracing::{debug, info, warn};

use crate::error::{IoError, Result};

const REAL_WIDTH: usize = 12;

/// FRD file representation
#[derive(Debug, Clone)]
pub struct FrdFile {
    /// Header information
    pub header: FrdHeader,
    /// Undeformed mesh in file order
    pub mesh: Mesh,
    /// One entry per `100C` result block
    pub result_blocks: Vec<ResultBlock>,
    path: Option<PathBuf>,
}

/// FRD file header
#[derive(Debug, Clone, Default)]
pub struct FrdHeader {
    /// Model name from the `1C` record
    pub job_name: String,
    /// Additional header lines (`1U`, `1P`)
    pub info: Vec<String>,
}

/// Result block for one step
#[derive(Debug, Clone)]
pub struct ResultBlock {
    /// Step number
    pub step: u32,
    /// Time/frequency value
    pub time: f64,
    /// Result datasets in this block
    pub datasets: Vec<ResultDataset>,
}

/// Result dataset (one variable for all nodes)
#[derive(Debug, Clone)]
pub struct ResultDataset {
    /// Dataset name (e.g., "DISP", "STRESS", "NDTEMP")
    pub name: String,
    /// Component names, derived `ALL` entries excluded
    pub comp_names: Vec<String>,
    pub field: ResultField,
}

impl FrdFile {
    /// Read FRD file from path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound(path.to_path_buf()));
        }
        info!("Reading FRD result file {:?}", path);
        let file = File::open(path)?;
        let mut frd = Self::from_reader(BufReader::new(file))?;
        frd.path = Some(path.to_path_buf());
        Ok(frd)
    }

    pub fn parse_str(raw: &str) -> Result<Self> {
        Self::from_reader(raw.as_bytes())
    }

    /// Read FRD file from a buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
        let mut cursor = Cursor { lines: &lines, pos: 0 };

        let mut frd = FrdFile {
            header: FrdHeader::default(),
            mesh: Mesh::new(),
            result_blocks: Vec::new(),
            path: None,
        };

        while let Some((line_no, line)) = cursor.next_line() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with("9999") {
                break;
            } else if trimmed.starts_with("100C") {
                let fallback_step = frd.result_blocks.len() as u32 + 1;
                let block = cursor.read_result_block(line, line_no, fallback_step)?;
                frd.result_blocks.push(block);
            } else if trimmed.starts_with("2C") {
                let id_width = id_field_width(format_flag(trimmed), line_no)?;
                cursor.read_node_block(&mut frd.mesh, id_width)?;
            } else if trimmed.starts_with("3C") {
                let id_width = id_field_width(format_flag(trimmed), line_no)?;
                cursor.read_element_block(&mut frd.mesh, id_width)?;
            } else if let Some(name) = trimmed.strip_prefix("1C") {
                frd.header.job_name = name.trim().to_string();
            } else if trimmed.starts_with('1') {
                frd.header.info.push(trimmed.to_string());
            }
        }

        if let Err(message) = frd.mesh.validate() {
            return Err(IoError::InvalidData(message));
        }

        debug!(
            "FRD parsed: {} nodes, {} elements, {} result blocks",
            frd.mesh.node_count(),
            frd.mesh.element_count(),
            frd.result_blocks.len()
        );
        Ok(frd)
    }

    /// Path the file was read from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// First dataset called `name` in any block of `step`
    pub fn dataset(&self, step: u32, name: &str) -> Option<&ResultDataset> {
        self.result_blocks
            .iter()
            .filter(|block| block.step == step)
            .flat_map(|block| block.datasets.iter())
            .find(|dataset| dataset.name.eq_ignore_ascii_case(name))
    }

    fn has_dataset(&self, name: &str) -> bool {
        self.result_blocks
            .iter()
            .flat_map(|block| block.datasets.iter())
            .any(|dataset| dataset.name.eq_ignore_ascii_case(name))
    }
}

/// FRD dataset name holding a quantity
fn dataset_name(quantity: Quantity) -> &'static str {
    match quantity {
        Quantity::Displacement => "DISP",
        Quantity::Stress => "STRESS",
        Quantity::Temperature => "NDTEMP",
    }
}

impl ResultRepository for FrdFile {
    fn mesh(&self) -> Mesh {
        self.mesh.clone()
    }

    fn has_physics(&self, physics: Physics) -> bool {
        match physics {
            Physics::Structural => self.has_dataset("DISP") || self.has_dataset("STRESS"),
            Physics::Thermal => self.has_dataset("NDTEMP"),
        }
    }

    fn result_sets(&self) -> Vec<u32> {
        let mut steps: Vec<u32> = self.result_blocks.iter().map(|b| b.step).collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }

    fn quantity(&self, set: u32, quantity: Quantity) -> Option<ResultField> {
        let dataset = self.dataset(set, dataset_name(quantity))?;
        if dataset.field.components() != quantity.components() {
            warn!(
                "dataset {} of step {} has {} components, expected {}",
                dataset.name,
                set,
                dataset.field.components(),
                quantity.components()
            );
            return None;
        }
        Some(dataset.field.clone())
    }

    fn source_path(&self) -> Option<&Path> {
        self.path()
    }
}

struct Cursor<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Next line with its 1-based line number
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line.as_str()))
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).map(String::as_str)
    }

    /// Read node coordinate block (record type 2)
    fn read_node_block(&mut self, mesh: &mut Mesh, id_width: usize) -> Result<()> {
        while let Some((line_no, line)) = self.next_line() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("-3") {
                break;
            }
            let Some(body) = trimmed.strip_prefix("-1") else {
                continue;
            };

            let id = parse_id(body, id_width, line_no)?;
            let coords = parse_reals(&body[id_width.min(body.len())..], line_no)?;
            if coords.len() < 3 {
                return Err(IoError::parse(line_no, "node record needs 3 coordinates"));
            }
            mesh.add_node(Node::new(id, coords[0], coords[1], coords[2]));
        }
        Ok(())
    }

    /// Read element connectivity block (record type 3)
    fn read_element_block(&mut self, mesh: &mut Mesh, id_width: usize) -> Result<()> {
        while let Some((line_no, line)) = self.next_line() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("-3") {
                break;
            }
            let Some(body) = trimmed.strip_prefix("-1") else {
                continue;
            };

            // -1<elem_id><type:5><group:5><material:5>
            let id = parse_id(body, id_width, line_no)?;
            let type_field = column(body, id_width, id_width + 5).trim();
            let type_code: i32 = type_field.parse().map_err(|_| {
                IoError::parse(line_no, format!("invalid element type '{type_field}'"))
            })?;

            let mut nodes = Vec::new();
            while let Some(next) = self.peek() {
                let Some(node_data) = next.trim_start().strip_prefix("-2") else {
                    break;
                };
                let (node_line_no, _) = self.next_line().unwrap_or((0, ""));
                for chunk in node_data.as_bytes().chunks(id_width) {
                    let text = std::str::from_utf8(chunk).unwrap_or("").trim();
                    if text.is_empty() {
                        continue;
                    }
                    let node_id = text.parse::<i32>().map_err(|_| {
                        IoError::parse(node_line_no, format!("invalid node id '{text}'"))
                    })?;
                    nodes.push(node_id);
                }
            }

            let Some(shape) = ElementShape::from_frd_code(type_code) else {
                warn!("skipping element {id}: unsupported FRD type code {type_code}");
                continue;
            };
            let element = Element::new(id, shape, standard_node_order(shape, nodes));
            mesh.add_element(element)
                .map_err(|message| IoError::parse(line_no, message))?;
        }
        Ok(())
    }

    /// Read result data block (record type 100)
    fn read_result_block(
        &mut self,
        header_line: &str,
        header_no: usize,
        fallback_step: u32,
    ) -> Result<ResultBlock> {
        // 100C<setname:6><value:E12.5><numnod:I12><text:20><ictype:I2><numstp:I5><analys:10><format:I2>
        let start = header_line.find("100C").map_or(0, |i| i + 4);
        let rest = &header_line[start..];
        let time = column(rest, 6, 18).trim().parse::<f64>().unwrap_or(0.0);
        let step = column(rest, 52, 57)
            .trim()
            .parse::<u32>()
            .unwrap_or(fallback_step);
        let format = column(rest, 67, 69).trim().parse::<i32>().unwrap_or(1);
        let id_width = id_field_width(format, header_no)?;

        let mut name = String::new();
        let mut irtype = 1;
        let mut declared_comps = 0usize;
        let mut comp_names = Vec::new();
        let mut entries: Vec<(i32, Vec<f64>, usize)> = Vec::new();

        while let Some((line_no, line)) = self.next_line() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("-3") {
                break;
            }

            if trimmed.starts_with("-4") {
                let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                name = tokens.get(1).copied().unwrap_or_default().to_string();
                declared_comps = tokens.get(2).and_then(|t| t.parse().ok()).unwrap_or(0);
                irtype = tokens.get(3).and_then(|t| t.parse().ok()).unwrap_or(1);
            } else if trimmed.starts_with("-5") {
                let comp = trimmed.split_whitespace().nth(1).unwrap_or_default();
                if !comp.eq_ignore_ascii_case("ALL") {
                    comp_names.push(comp.to_string());
                }
            } else if let Some(body) = trimmed.strip_prefix("-1") {
                let id = parse_id(body, id_width, line_no)?;
                let values = parse_reals(&body[id_width.min(body.len())..], line_no)?;
                entries.push((id, values, line_no));
            } else if let Some(body) = trimmed.strip_prefix("-2") {
                let values = parse_reals(&body[id_width.min(body.len())..], line_no)?;
                match entries.last_mut() {
                    Some((_, existing, _)) => existing.extend(values),
                    None => {
                        return Err(IoError::parse(line_no, "continuation record without entity"));
                    }
                }
            }
        }

        if name.is_empty() {
            return Err(IoError::parse(header_no, "result block without -4 dataset record"));
        }

        let components = if comp_names.is_empty() {
            declared_comps
        } else {
            comp_names.len()
        };
        let location = if irtype == 3 {
            ResultLocation::ElementNodal
        } else {
            ResultLocation::Nodal
        };

        let mut field = ResultField::new(name.clone(), location, components);
        for (id, values, line_no) in entries {
            if values.len() < components {
                return Err(IoError::parse(
                    line_no,
                    format!(
                        "{name}: entity {id} has {} values, expected {components}",
                        values.len()
                    ),
                ));
            }
            field
                .push(id, &values[..components])
                .map_err(|message| IoError::parse(line_no, message))?;
        }

        debug!("step {step}: dataset {name} with {} entries", field.len());
        Ok(ResultBlock {
            step,
            time,
            datasets: vec![ResultDataset {
                name,
                comp_names,
                field,
            }],
        })
    }
}

/// Byte column range of a record, clamped to the line length
fn column(s: &str, start: usize, end: usize) -> &str {
    let len = s.len();
    s.get(start.min(len)..end.min(len)).unwrap_or("")
}

/// Format flag is the last field of `2C`/`3C` headers: 0 = short, 1 = long, 2 = binary
fn format_flag(header: &str) -> i32 {
    header
        .split_whitespace()
        .last()
        .and_then(|t| t.parse().ok())
        .unwrap_or(1)
}

fn id_field_width(format: i32, line_no: usize) -> Result<usize> {
    match format {
        0 => Ok(5),
        1 => Ok(10),
        other => Err(IoError::parse(
            line_no,
            format!("unsupported FRD format flag {other} (only ASCII short/long)"),
        )),
    }
}

fn parse_id(body: &str, width: usize, line_no: usize) -> Result<i32> {
    let text = column(body, 0, width).trim();
    text.parse()
        .map_err(|_| IoError::parse(line_no, format!("invalid entity id '{text}'")))
}

/// Parse consecutive E12.5 fields
fn parse_reals(data: &str, line_no: usize) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for chunk in data.as_bytes().chunks(REAL_WIDTH) {
        let text = std::str::from_utf8(chunk).unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let value = text
            .parse::<f64>()
            .map_err(|_| IoError::parse(line_no, format!("invalid real '{text}'")))?;
        values.push(value);
    }
    Ok(values)
}

/// CalculiX writes the edge nodes of he20 and pe15 elements with the
/// vertical edges before the top edges; restore corner/bottom/top/vertical order.
fn standard_node_order(shape: ElementShape, nodes: Vec<i32>) -> Vec<i32> {
    match shape {
        ElementShape::Hex20 if nodes.len() == 20 => {
            let mut ordered = nodes[..12].to_vec();
            ordered.extend_from_slice(&nodes[16..20]);
            ordered.extend_from_slice(&nodes[12..16]);
            ordered
        }
        ElementShape::Wedge15 if nodes.len() == 15 => {
            let mut ordered = nodes[..9].to_vec();
            ordered.extend_from_slice(&nodes[12..15]);
            ordered.extend_from_slice(&nodes[9..12]);
            ordered
        }
        _ => nodes,
    }
}
