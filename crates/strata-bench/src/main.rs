use std::process;

use strata_bench::options::{Options, USAGE};
use strata_core::{EngineConfig, MaterialTable};
use strata_bench::report;
use strata_bench::runner::BenchmarkRunner;
use strata_bench::scenes;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let default_scratch = std::env::temp_dir().join(format!("strata-bench-{}", process::id()));
    let options = match Options::parse(std::env::args().skip(1), default_scratch) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            process::exit(1);
        }
    };
    if options.help {
        eprintln!("{USAGE}");
        process::exit(0);
    }

    let base = match &options.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    };
    let materials = match &options.materials {
        Some(path) => MaterialTable::load(path),
        None => Ok(MaterialTable::builtin()),
    };
    let (base, materials) = match (base, materials) {
        (Ok(base), Ok(materials)) => (base, materials),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("{e}");
            process::exit(1);
        }
    };
    log::info!("{} materials, seed {}", materials.len(), base.seed);

    let runner = if options.gpu {
        log::info!("Initializing GPU...");
        match BenchmarkRunner::with_gpu(options.scratch.clone(), base, materials) {
            Some(runner) => runner,
            None => {
                log::error!("no suitable GPU adapter found");
                process::exit(1);
            }
        }
    } else {
        BenchmarkRunner::new(options.scratch.clone(), base, materials)
    };

    let mut results = Vec::new();
    for scene in &scenes::standard_scenes() {
        match runner.run_scene(scene) {
            Ok(result) => results.push(result),
            Err(e) => {
                log::error!("scene '{}' failed: {e}", scene.name);
                process::exit(1);
            }
        }
    }
    let _ = std::fs::remove_dir_all(&options.scratch);

    println!("\n## Streaming Benchmark\n");
    println!("{}", report::format_markdown(&results));

    if let Some(path) = &options.output {
        let baseline = report::Baseline {
            label: format!("bench-{}", process::id()),
            results: results.clone(),
        };
        if let Err(e) = report::save_baseline(path, &baseline) {
            log::error!("failed to save baseline {}: {e}", path.display());
            process::exit(1);
        }
        log::info!("Saved baseline to {}", path.display());
    }

    let Some(path) = &options.baseline else {
        log::info!("Benchmark complete.");
        return;
    };
    let Some(baseline) = report::load_baseline(path) else {
        log::warn!("Baseline file not found: {}", path.display());
        return;
    };
    let regressions = report::compare(&results, &baseline, options.regression_threshold);
    println!(
        "{}",
        report::format_comparison(&regressions, options.regression_threshold)
    );
    if !regressions.is_empty() {
        log::error!("{} metrics regressed against '{}'", regressions.len(), baseline.label);
        process::exit(1);
    }
    log::info!("Benchmark complete.");
}
