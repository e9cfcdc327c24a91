use crate::race::course::CourseDescriptor;
use crate::race::export_csv::write_frame_trace;
use crate::race::profile::load_profile;
use crate::race::skills::{Rarity, SkillCatalog};
use crate::race::stepper::RaceConfig;
use crate::sim::contribution::analyze_contribution;
use crate::sim::monte_carlo::{run_monte_carlo, CancelToken, SimulationOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Contribution,
    Skills,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("contribution") => Some(Command::Contribution),
        Some("skills") => Some(Command::Skills),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Contribution) => handle_contribution(args),
        Some(Command::Skills) => handle_skills(args),
        None => {
            eprintln!("usage: furlong <simulate|contribution|skills>");
            2
        }
    }
}

fn build_config(args: &[String]) -> RaceConfig {
    let profile = flag_value(args, "--profile")
        .and_then(load_profile)
        .unwrap_or_default();
    let course = if args.iter().any(|arg| arg == "--dirt") {
        CourseDescriptor::sample_dirt_1400()
    } else {
        CourseDescriptor::sample_turf_2000()
    };
    RaceConfig::new(profile, course)
}

fn load_catalog(args: &[String]) -> SkillCatalog {
    flag_value(args, "--skills")
        .and_then(SkillCatalog::load_json)
        .unwrap_or_else(SkillCatalog::builtin)
}

fn handle_simulate(args: &[String]) -> i32 {
    let trials = parse_i64_arg(args.get(2), "trials", 1000);
    let seed = args.get(3).and_then(|value| value.parse::<u64>().ok());
    let as_table = args.iter().any(|arg| arg == "--table");
    let trace_path = flag_value(args, "--trace");

    let config = build_config(args);
    let catalog = load_catalog(args);
    let options = SimulationOptions {
        trials,
        seed,
        record_representative: trace_path.is_some(),
        ..SimulationOptions::default()
    };

    let Some(output) = run_monte_carlo(&config, &catalog, &options, None, &CancelToken::new())
    else {
        eprintln!("simulation produced no results (trials={trials})");
        return 1;
    };

    if let Some(path) = trace_path {
        let Some(frames) = output.representative.as_deref() else {
            eprintln!("no representative trace was recorded");
            return 1;
        };
        if let Err(err) = write_frame_trace(&path, frames, &catalog) {
            eprintln!("failed to write trace '{path}': {err}");
            return 1;
        }
        eprintln!("wrote {} frames to {path}", frames.len());
    }

    if as_table {
        let summary = &output.summary;
        println!("trials\tseed\taverage_time\tbest_time\tworst_time\tmax_spurt_rate");
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}",
            summary.trials,
            output.seed,
            summary.all.average_time,
            summary.all.best_time,
            summary.all.worst_time,
            summary.max_spurt_rate
        );
        0
    } else {
        print_json(&output)
    }
}

fn handle_contribution(args: &[String]) -> i32 {
    let trials = parse_i64_arg(args.get(2), "trials", 1000);
    let seed = args.get(3).and_then(|value| value.parse::<u64>().ok());

    let config = build_config(args);
    let catalog = load_catalog(args);
    let options = SimulationOptions {
        trials,
        seed,
        record_representative: false,
        ..SimulationOptions::default()
    };

    match analyze_contribution(&config, &catalog, &options, &CancelToken::new()) {
        Some(table) => print_json(&table),
        None => {
            eprintln!("contribution analysis needs at least 5 trials (got {trials})");
            1
        }
    }
}

fn handle_skills(args: &[String]) -> i32 {
    let catalog = load_catalog(args);
    println!("id\tname\trarity\tsp_cost");
    for (_, skill) in catalog.iter() {
        let rarity = match skill.rarity {
            Rarity::Normal => "normal",
            Rarity::Rare => "rare",
            Rarity::Unique => "unique",
            Rarity::Evo => "evo",
        };
        println!(
            "{}\t{}\t{}\t{}",
            skill.id, skill.name, rarity, skill.sp_cost
        );
    }
    0
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize result: {err}");
            1
        }
    }
}

/// Value following a `--flag`, when present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}

fn parse_i64_arg(raw: Option<&String>, name: &str, default: i64) -> i64 {
    raw.and_then(|value| value.parse::<i64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
