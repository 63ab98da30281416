use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rt3d_io::FrdFile;
use rt3d_translate::{
    RequestForm, TranslationPipeline, TranslatorConfig, WriterSink, describe_archive,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Translate CalculiX results into deformed 3D geometry files
#[derive(Parser, Debug)]
#[command(name = "rt3d", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one result field on the deformed mesh to a 3D file
    Translate(TranslateArgs),
    /// List the mesh, physics and result sets of an archive
    Inspect {
        /// Result archive (.frd)
        archive: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Result archive (.frd)
    archive: Option<PathBuf>,

    /// Result set (solution step or mode), starting at 1
    #[arg(long, short = 's')]
    set: Option<String>,

    /// Peak deflection as a percentage of the model size
    #[arg(long, short = 'p')]
    percent: Option<String>,

    /// Result type: u ux uy uz usum sx sy sz xy xz yz s1 s2 s3 seqv tmp
    #[arg(long, short = 'r')]
    result: Option<String>,

    /// Output format: vtk stl obj wrl none
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Output file root, files are named <root>-<result>-<set>.<ext>
    #[arg(long)]
    root: Option<String>,

    /// Preview the scene before writing the file
    #[arg(long)]
    plot: bool,

    /// JSON translator settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for output files, overrides the settings file
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn translate(args: TranslateArgs) -> ExitCode {
    let form = RequestForm {
        result_set: args.set,
        percent: args.percent,
        result_kind: args.result,
        result_file: args.archive,
        output_format: args.format,
        output_root: args.root,
        plot: args.plot,
    };
    let request = match form.validate() {
        Ok(request) => request,
        Err(err) => {
            eprintln!("error: missing input, please specify a value for each input:");
            for entry in &err.missing {
                eprintln!("  - {entry}");
            }
            return ExitCode::from(2);
        }
    };

    let mut config = match args.config {
        Some(path) => match TranslatorConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::from(2);
            }
        },
        None => TranslatorConfig::default(),
    };
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir;
    }

    let mut sink = WriterSink::new(io::stdout());
    match TranslationPipeline::new(config).run_file(&request, &mut sink) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(1),
    }
}

fn inspect(archive: PathBuf) -> ExitCode {
    let frd = match FrdFile::from_file(&archive) {
        Ok(frd) => frd,
        Err(err) => {
            eprintln!("read error: {err}");
            return ExitCode::from(1);
        }
    };
    println!("archive: {}", archive.display());
    if !frd.header.job_name.is_empty() {
        println!("job: {}", frd.header.job_name);
    }
    for line in describe_archive(&frd) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Translate(args) => translate(args),
        Command::Inspect { archive } => inspect(archive),
    }
}
