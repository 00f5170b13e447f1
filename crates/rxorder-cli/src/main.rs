use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rxorder_core::validation::{to_international, validate_otp};
use rxorder_core::{
    ApiClient, ClientConfig, LoginPayload, Order, OrderDraft, OrderFeed, OrdersQuery,
    SessionStore, ValidationError, VerifyOtpPayload,
};

#[derive(Parser, Debug)]
#[command(name = "rxorder")]
#[command(author, version, about = "Prescription ordering client", long_about = None)]
struct Cli {
    /// API base URL
    #[arg(long, env = "API_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Path to the session database
    #[arg(long, default_value = "rxorder.db", global = true)]
    state: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    timeout_secs: u64,

    /// Ask the server for a real OTP instead of the development one
    #[arg(long, global = true)]
    no_dev: bool,

    /// Override log level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request an OTP for a 10-digit mobile number
    Login {
        #[arg(long)]
        phone: String,
    },
    /// Verify the OTP and store the session
    Verify {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        otp: String,
    },
    /// List orders
    Orders {
        /// Fetch a single page
        #[arg(long, conflicts_with = "all")]
        page: Option<u32>,
        /// Follow pages until the server reports no more
        #[arg(long)]
        all: bool,
        /// Filter by patient, doctor, id or status
        #[arg(long)]
        search: Option<String>,
    },
    /// Create an order
    Create(DraftArgs),
    /// Replace an order's details
    Update {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Clear the stored session
    Logout,
    /// Show the stored session
    Whoami,
}

#[derive(Args, Debug)]
struct DraftArgs {
    #[arg(long)]
    doctor: String,
    #[arg(long)]
    patient: String,
    #[arg(long)]
    hospital: String,
    #[arg(long)]
    referral: Option<String>,
    #[arg(long)]
    coupon: Option<String>,
    /// Prescription image URL (repeatable)
    #[arg(long = "prescription", required = true)]
    prescriptions: Vec<String>,
}

impl DraftArgs {
    fn into_draft(self) -> Result<OrderDraft> {
        let draft = OrderDraft {
            doctor_name: self.doctor,
            patient_name: self.patient,
            hospital_address: self.hospital,
            referral_name: self.referral,
            coupon_code: self.coupon,
            prescription_urls: self.prescriptions,
        };
        if let Err(ValidationError::OrderIncomplete(errors)) = draft.validate() {
            let messages: Vec<String> = [errors.doctor, errors.patient, errors.hospital, errors.image]
                .into_iter()
                .flatten()
                .collect();
            bail!("{}", messages.join("; "));
        }
        Ok(draft)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.clone().unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ClientConfig::default()
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_dev_mode(!cli.no_dev);
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.trim());
    }

    let session = SessionStore::open(&cli.state)
        .with_context(|| format!("Failed to open session store at {}", cli.state.display()))?;
    let client = ApiClient::new(
        config,
        Arc::new(session),
        Arc::new(|| tracing::warn!("session expired, sign in again")),
    )?;

    run(&client, cli.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
    let dev = client.config().dev_mode;
    match command {
        Command::Login { phone } => {
            let phone = to_international(phone.trim())?;
            client
                .login(&LoginPayload {
                    phone: phone.clone(),
                    dev,
                })
                .await?;
            println!("OTP sent to {}", phone);
        }
        Command::Verify { phone, otp } => {
            let phone = to_international(phone.trim())?;
            validate_otp(&otp)?;
            client
                .verify_and_store(&VerifyOtpPayload { phone, otp, dev })
                .await?;
            print_session(client)?;
        }
        Command::Orders { page, all, search } => {
            let orders = if all {
                let mut feed = OrderFeed::new();
                while feed.load_more(client).await? {}
                feed.orders().to_vec()
            } else {
                client.get_orders(OrdersQuery { page }).await?.orders
            };
            let term = search.unwrap_or_default();
            let matches = rxorder_core::filter_orders(&orders, &term);
            for order in &matches {
                print_order(order);
            }
            println!("{} order(s)", matches.len());
        }
        Command::Create(args) => {
            let order = client.create_order(&args.into_draft()?).await?;
            print_order(&order);
        }
        Command::Update { id, draft } => {
            let order = client.update_order(&id, &draft.into_draft()?).await?;
            print_order(&order);
        }
        Command::Logout => {
            client.logout()?;
            println!("Signed out");
        }
        Command::Whoami => print_session(client)?,
    }
    Ok(())
}

fn print_session(client: &ApiClient) -> Result<()> {
    let session = client.session().snapshot();
    let summary = serde_json::json!({
        "authenticated": session.is_authenticated(),
        "user": session.user,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_order(order: &Order) {
    println!(
        "{:<10} {:<22} {:<20} {:<20} {}",
        order.display_id(),
        order.status.label(),
        order.patient_name,
        order.doctor_name,
        order.created_at.format("%d %b %Y"),
    );
}
