use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bmp_core::config::{summarizer_from_env_values, ConfigValues};
use bmp_core::reference::atc::{known_atc_codes, substances_from_atc};
use bmp_core::{assess_renal, BmpService, KnowledgeBase};
use bmp_types::{Demographics, Sex};

#[derive(Parser)]
#[command(name = "bmp")]
#[command(about = "Medication review (BMP) rule engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize medication names to canonical substances
    Normalize {
        /// Medication names, brands or codes
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Detect drug-drug interactions
    Interactions {
        /// Medication names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Evaluate STOPP/START criteria
    Rules {
        /// Patient age in years
        #[arg(long)]
        age: u32,
        /// Patient sex (M, F or U)
        #[arg(long, default_value = "U")]
        sex: String,
        /// Medication names
        names: Vec<String>,
    },
    /// Compute the anticholinergic burden score
    Burden {
        /// Medication names
        names: Vec<String>,
    },
    /// Estimate creatinine clearance (Cockcroft-Gault) and the renal dose adjustment
    Clcr {
        /// Serum creatinine (mg/dL)
        #[arg(long)]
        creatinine: f64,
        /// Age in years
        #[arg(long)]
        age: u32,
        /// Weight in kg
        #[arg(long)]
        weight: f64,
        /// Sex (M, F or U)
        #[arg(long, default_value = "U")]
        sex: String,
    },
    /// Run the full medication review
    Run {
        /// Patient age in years
        #[arg(long)]
        age: u32,
        /// Patient sex (M, F or U)
        #[arg(long, default_value = "U")]
        sex: String,
        /// Medication names
        names: Vec<String>,
    },
    /// List ATC classes, or the substances of one class
    Atc {
        /// ATC class code (e.g. C10AA)
        code: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bmp_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Normalize { names }) => {
            let service = build_service()?;
            for (name, substance) in names.iter().zip(service.normalize_all(&names)) {
                println!("{} -> {}", name, substance);
            }
        }
        Some(Commands::Interactions { names }) => {
            let service = build_service()?;
            let meds = service.normalize_all(&names);
            let found = service.detect_interactions(&meds);
            if found.is_empty() {
                println!("No interactions found.");
            } else {
                for description in found {
                    println!("- {}", description);
                }
            }
        }
        Some(Commands::Rules { age, sex, names }) => {
            let service = build_service()?;
            let demo = Demographics::new(age, Sex::parse(&sex))?;
            let meds = service.normalize_all(&names);
            let findings = service.evaluate_rules(&demo, &meds);
            println!("{}", serde_json::to_string_pretty(&findings)?);
        }
        Some(Commands::Burden { names }) => {
            let service = build_service()?;
            let meds = service.normalize_all(&names);
            println!("{}", service.compute_burden_score(&meds));
        }
        Some(Commands::Clcr {
            creatinine,
            age,
            weight,
            sex,
        }) => match assess_renal(creatinine, age, weight, Sex::parse(&sex)) {
            Ok(assessment) => println!(
                "ClCr: {:.2} mL/min, {}",
                assessment.clcr, assessment.adjustment
            ),
            Err(e) => eprintln!("Error computing clearance: {}", e),
        },
        Some(Commands::Run { age, sex, names }) => {
            let service = build_service()?;
            let demo = Demographics::new(age, Sex::parse(&sex))?;
            let report = service.run(&demo, &names);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Atc { code: Some(code) }) => {
            let substances = substances_from_atc(&code);
            if substances.is_empty() {
                println!("Unknown ATC class: {}", code);
            } else {
                for substance in substances {
                    println!("{}", substance);
                }
            }
        }
        Some(Commands::Atc { code: None }) => {
            for code in known_atc_codes() {
                println!("{}", code);
            }
        }
        None => {
            println!("Use 'bmp --help' for commands");
        }
    }

    Ok(())
}

fn build_service() -> Result<BmpService, Box<dyn std::error::Error>> {
    let cfg = ConfigValues {
        resources_dir: env("BMP_RESOURCES_DIR"),
        data_dir: env("BMP_DATA_DIR"),
        bdpm_spec_path: env("BDPM_CSV_PATH"),
        bdpm_compo_path: env("BDPM_COMPO_PATH"),
        criteria_path: env("BMP_CRITERIA_PATH"),
        interaction_precedence: env("BMP_INTERACTION_PRECEDENCE"),
    }
    .resolve()?;

    let summarizer = summarizer_from_env_values(
        env("BMP_SUMMARIZER_URL"),
        env("BMP_SUMMARIZER_MODEL"),
        env("BMP_SUMMARIZER_TIMEOUT_SECS"),
    )?;

    Ok(BmpService::new(Arc::new(KnowledgeBase::new(cfg)), summarizer))
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
