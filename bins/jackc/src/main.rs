use jack_compiler::diagnostics::Report;
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tracing::info;

#[derive(StructOpt)]
#[structopt(name = "jackc", about = "Compile Jack source files to .vm files.")]
struct Opt {
    /// The .jack source files to compile
    #[structopt(parse(from_os_str), required = true)]
    sources: Vec<PathBuf>,

    /// Print the grammar production trace instead of compiled output
    #[structopt(long)]
    trace: bool,

    /// Print compiled instructions to stdout instead of writing .vm files
    #[structopt(long)]
    stdout: bool,
}

fn compile_file(path: &Path, opt: &Opt) -> Result<bool, std::io::Error> {
    let source = std::fs::read_to_string(path)?;

    let result = if opt.trace {
        jack_compiler::compile_with_trace(&source).map(|(_, trace)| trace + "\n")
    } else {
        jack_compiler::compile(&source).map(|instructions| jack_vm::to_text(&instructions))
    };

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            let report = Report::new(&source, path.display().to_string());
            report.print(&mut std::io::stderr(), err.span(), &err.to_string())?;
            return Ok(false);
        }
    };

    if opt.trace || opt.stdout {
        print!("{}", output);
    } else {
        let out_path = path.with_extension("vm");
        std::fs::write(&out_path, output)?;
        info!("{} -> {}", path.display(), out_path.display());
    }

    Ok(true)
}

fn main() {
    tracing_subscriber::fmt().init();

    let opt = Opt::from_args();

    let mut failed = false;
    for source in &opt.sources {
        match compile_file(source, &opt) {
            Ok(true) => {}
            Ok(false) => failed = true,
            Err(err) => {
                eprintln!("{}: {}", source.display(), err);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
