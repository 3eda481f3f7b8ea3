use clap::Parser;
use snapyx_gateway::{share::share_intent_url, Gateway, GatewayConfig, PostTier};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate a social post (and optionally an image) from the command line
#[derive(Debug, Parser)]
#[command(name = "snapyx", version, about)]
struct Cli {
    /// Allow long-form posts
    #[arg(long)]
    premium: bool,

    /// Skip the price lookup and advice guard
    #[arg(long)]
    simple: bool,

    /// Also generate an image for the topic
    #[arg(long)]
    image: bool,

    /// What the post should be about
    #[arg(required = true)]
    topic: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let topic = cli.topic.join(" ");
    let tier = PostTier::from_premium_flag(cli.premium);
    let gateway = Gateway::from_config(GatewayConfig::from_env()?)?;

    info!(%tier, simple = cli.simple, image = cli.image, "Generating post from command line");

    let post = if cli.simple {
        gateway.generate_simple_post(&topic, tier).await?
    } else {
        gateway.generate_post(&topic, tier).await?
    };

    let image_url = if cli.image {
        Some(gateway.generate_image(&topic).await?.url)
    } else {
        None
    };

    println!("\n=== POST ({}) ===", tier);
    println!("{}", post);

    if let Some(url) = &image_url {
        println!("\nImage: {}", url);
    }

    println!("\nShare: {}", share_intent_url(Some(&post), image_url.as_deref())?);

    Ok(())
}
