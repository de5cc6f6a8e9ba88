//! Thin command-line glue over the k-file reader.
//!
//! Viewer integration and anything graphical stays out of this binary;
//! it only drives the ingestion and query APIs.

use std::process::ExitCode;

use kdyn_model::DynaModel;

fn usage() {
    eprintln!("usage: kdyn analyze [--json] (-d <dir> | <file.k>...)");
    eprintln!("       kdyn flatten (--part <pid> | --all) [--verbose] (-d <dir> | <file.k>...)");
}

struct Inputs {
    directory: Option<String>,
    files: Vec<String>,
}

impl Inputs {
    fn load(&self) -> kdyn_io::Result<DynaModel> {
        match &self.directory {
            Some(dir) => kdyn_io::read_dir(dir),
            None => kdyn_io::read_files(&self.files),
        }
    }
}

fn report_diagnostics(model: &DynaModel) {
    for diagnostic in model.diagnostics() {
        eprintln!("{diagnostic}");
    }
}

fn analyze(json: bool, inputs: &Inputs) -> ExitCode {
    let model = match inputs.load() {
        Ok(model) => model,
        Err(err) => {
            eprintln!("kdyn: {err}");
            return ExitCode::from(1);
        }
    };
    report_diagnostics(&model);

    let stats = model.stats();
    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("kdyn: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        println!("{}", stats.format());
    }
    ExitCode::SUCCESS
}

fn flatten(part: Option<i64>, verbose: bool, inputs: &Inputs) -> ExitCode {
    let model = match inputs.load() {
        Ok(model) => model,
        Err(err) => {
            eprintln!("kdyn: {err}");
            return ExitCode::from(1);
        }
    };
    report_diagnostics(&model);

    let (geometry, report) = match part {
        Some(pid) => match model.part_geometry(pid) {
            Some((geometry, diags)) => {
                for diagnostic in &diags {
                    eprintln!("{diagnostic}");
                }
                (geometry, None)
            }
            None => {
                eprintln!("kdyn: part {pid} not in model");
                return ExitCode::from(1);
            }
        },
        None => {
            let (geometry, report, diags) = model.model_geometry();
            for diagnostic in &diags {
                eprintln!("{diagnostic}");
            }
            (geometry, Some(report))
        }
    };

    println!("vertices: {}", geometry.vertices.len());
    println!("faces: {}", geometry.faces.len());
    if verbose {
        if let (Some(first), Some(last)) = (geometry.vertices.first(), geometry.vertices.last()) {
            println!("first vertex: {first:?}");
            println!("last vertex: {last:?}");
        }
        if let (Some(first), Some(last)) = (geometry.faces.first(), geometry.faces.last()) {
            println!("first face: {first:?}");
            println!("last face: {last:?}");
        }
        if let Some(report) = report {
            println!("unreferenced_nodes: {}", report.unreferenced_nodes);
            println!("unreferenced_elements: {}", report.unreferenced_elements);
            println!("undefined_slots: {}", report.undefined_slots);
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        usage();
        return ExitCode::from(2);
    };

    let mut json = false;
    let mut verbose = false;
    let mut all = false;
    let mut part: Option<i64> = None;
    let mut directory: Option<String> = None;
    let mut files = Vec::new();

    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--verbose" => verbose = true,
            "--all" => all = true,
            "--part" => {
                let Some(pid) = rest.next().and_then(|p| p.parse::<i64>().ok()) else {
                    usage();
                    return ExitCode::from(2);
                };
                part = Some(pid);
            }
            "-d" | "--directory" => {
                let Some(dir) = rest.next() else {
                    usage();
                    return ExitCode::from(2);
                };
                directory = Some(dir.clone());
            }
            _ => files.push(arg.clone()),
        }
    }

    if directory.is_none() && files.is_empty() {
        usage();
        return ExitCode::from(2);
    }
    let inputs = Inputs { directory, files };

    match command.as_str() {
        "analyze" => analyze(json, &inputs),
        "flatten" if part.is_some() || all => flatten(part, verbose, &inputs),
        _ => {
            usage();
            ExitCode::from(2)
        }
    }
}
