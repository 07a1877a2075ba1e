use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fhir::FhirClient;
use meld_core::constants::DEFAULT_FHIR_TIMEOUT_SECS;
use meld_core::{
    calculate_score, validate_all, CoreConfig, MeldService, MissingLabPolicy, RawParameters,
};

#[derive(Parser)]
#[command(name = "meld")]
#[command(about = "MELD score calculator (OPTN)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a MELD score from lab values
    Score {
        /// Sex: male or female
        #[arg(long)]
        sex: String,
        /// Total bilirubin (mg/dL)
        #[arg(long)]
        bilirubin: f64,
        /// Serum sodium (mEq/L)
        #[arg(long)]
        sodium: f64,
        /// INR
        #[arg(long)]
        inr: f64,
        /// Albumin (g/dL)
        #[arg(long)]
        albumin: f64,
        /// Serum creatinine (mg/dL)
        #[arg(long)]
        creatinine: f64,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        /// Two or more dialysis treatments, or 24h of CVVHD, in the prior week
        #[arg(long)]
        dialysis: bool,
        /// Calculate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Fetch a patient's labs from a FHIR server and print the MELD card detail
    Fetch {
        /// FHIR server base URL
        #[arg(long)]
        fhir_server: String,
        /// Patient resource id
        #[arg(long)]
        patient_id: String,
        /// Bearer access token (optional)
        #[arg(long)]
        token: Option<String>,
        /// Feed missing labs to validation as zero instead of blocking the score
        #[arg(long)]
        zero_fill: bool,
        /// Request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_FHIR_TIMEOUT_SECS)]
        timeout: u64,
        /// Calculate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Score {
            sex,
            bilirubin,
            sodium,
            inr,
            albumin,
            creatinine,
            dob,
            dialysis,
            today,
        }) => {
            let today = today.unwrap_or_else(local_today);
            let raw = RawParameters {
                sex,
                bilirubin,
                sodium,
                inr,
                albumin,
                creatinine,
                had_dialysis: dialysis,
                date_of_birth: dob,
            };

            match validate_all(&raw, today) {
                Ok(params) => {
                    let result = calculate_score(&params, today);
                    match result.value() {
                        Some(score) => println!("MELD score: {}", score),
                        None => {
                            for error in result.errors() {
                                eprintln!("Not calculated: {}", error);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        eprintln!("Invalid {}: {}", error.field(), error);
                    }
                }
            }
        }
        Some(Commands::Fetch {
            fhir_server,
            patient_id,
            token,
            zero_fill,
            timeout,
            today,
        }) => {
            let policy = if zero_fill {
                MissingLabPolicy::ZeroFill
            } else {
                MissingLabPolicy::Block
            };
            let cfg = CoreConfig::new(Duration::from_secs(timeout), policy)?;
            let client = FhirClient::new(&fhir_server, token, cfg.fhir_timeout())?;
            let service = MeldService::new(Arc::new(cfg));

            let inputs = client.fetch_meld_inputs(&patient_id).await;
            let report = service.report(&inputs, today.unwrap_or_else(local_today));
            println!("{}", report.detail);
        }
        None => {
            println!("Use 'meld --help' for commands");
        }
    }

    Ok(())
}
