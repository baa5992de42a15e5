mod accents;
mod api;
mod audio;
mod cache;
mod detector;
mod normalize;

use crate::accents::ACCENT_DATABASE;
use crate::api::PredictionClient;
use crate::audio::{AudioRecorder, RECORDING_CEILING};
use crate::cache::{ImageCache, RecordingHistory};
use crate::detector::DetectorSession;
use crate::normalize::Prediction;
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "accent-detect")]
#[command(about = "Lightweight CLI client for accent, region, and cuisine detection")]
#[command(version = "0.1.0")]
struct Cli {
    /// Backend base URL (overrides ACCENT_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a clip and submit it for accent analysis
    Detect {
        /// Maximum recording duration in seconds (hard ceiling: 5)
        #[arg(long, default_value = "5")]
        max_duration: u64,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Render a bundled mock prediction without recording or uploading
        #[arg(long)]
        mock: bool,
    },

    /// List available audio recording devices
    Devices,

    /// Show recent recording history
    History,

    /// List the bundled accent and cuisine database
    Regions,

    /// Fetch dish information for a region
    Dish {
        #[arg(long)]
        region: String,
    },

    /// Check backend reachability
    Status,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            max_duration,
            format,
            mock,
        } => {
            run_detect(cli.backend_url.as_deref(), max_duration, format, mock).await;
        }

        Commands::Devices => {
            match AudioRecorder::list_devices() {
                Ok(devices) => {
                    println!("Available Audio Devices:");
                    println!(
                        "{:<30} {:<10} {:<20} Formats",
                        "Name", "Default", "Sample Rates"
                    );
                    println!("{}", "-".repeat(80));

                    for device in devices {
                        let default_str = if device.is_default { "YES" } else { "NO" };
                        let sample_rates = device
                            .supported_sample_rates
                            .iter()
                            .take(3)
                            .map(|sr| sr.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");

                        let formats = device
                            .supported_formats
                            .iter()
                            .take(2)
                            .map(|f| format!("{:?}", f))
                            .collect::<Vec<_>>()
                            .join(", ");

                        println!(
                            "{:<30} {:<10} {:<20} {}",
                            truncate_cell(&device.name, 30),
                            default_str,
                            sample_rates,
                            formats
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Failed to list audio devices: {}", e);
                }
            }
        }

        Commands::History => {
            let history = RecordingHistory::load_default();
            if history.is_empty() {
                println!("No recordings yet");
            } else {
                println!("Recent Recordings:");
                println!("{:<22} {:<10} Size", "Timestamp", "Duration");
                println!("{}", "-".repeat(45));
                for entry in history.entries() {
                    println!(
                        "{:<22} {:<10} {}",
                        entry.timestamp, entry.duration, entry.size
                    );
                }
            }
        }

        Commands::Regions => {
            println!("Bundled Accent Database:");
            println!(
                "{:<12} {:<24} {:<22} Characteristics",
                "Region", "Area", "Language"
            );
            println!("{}", "-".repeat(100));
            for profile in &ACCENT_DATABASE {
                println!(
                    "{:<12} {:<24} {:<22} {}",
                    profile.region,
                    profile.area,
                    profile.language,
                    profile.characteristics.join(", ")
                );
            }

            println!("\nRegional Cuisines:");
            for profile in &ACCENT_DATABASE {
                println!(
                    "{:<12} {} ({})",
                    profile.region,
                    profile.cuisine.name,
                    profile.cuisine.dishes.join(", ")
                );
            }
        }

        Commands::Dish { region } => {
            run_dish(cli.backend_url.as_deref(), &region).await;
        }

        Commands::Status => {
            let client = PredictionClient::new(cli.backend_url.as_deref());
            match client.health().await {
                Ok(health) => {
                    println!("Backend {} is reachable", client.base_url());
                    match serde_json::to_string_pretty(&health) {
                        Ok(json) => println!("{}", json),
                        Err(e) => eprintln!("Failed to render health response: {}", e),
                    }
                }
                Err(e) => {
                    eprintln!("Backend {} unreachable: {}", client.base_url(), e);
                }
            }
        }
    }
}

async fn run_detect(
    backend_url: Option<&str>,
    max_duration: u64,
    format: OutputFormat,
    mock: bool,
) {
    if mock {
        render_prediction(&accents::mock_prediction(), &format, None);
        return;
    }

    let client = PredictionClient::new(backend_url);
    let base_url = client.base_url().to_string();

    // Image prefetch runs alongside the recording flow; it never blocks it
    let prefetch = tokio::spawn(async move {
        let mut images = ImageCache::new(&base_url);
        images.preload().await;
        images
    });

    let recorder = AudioRecorder::new();
    let history = RecordingHistory::load_default();
    let mut session = DetectorSession::new(recorder, client, history);
    session.open();

    // Enter on stdin is the "mic tap" that stops the recording early
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = stop_tx.send(());
    });

    let ceiling = Duration::from_secs(max_duration).min(RECORDING_CEILING);

    match session.run_detection(ceiling, stop_rx).await {
        Ok(prediction) => {
            // Results never wait on the prefetch; use it only if done
            let images = if prefetch.is_finished() {
                prefetch.await.ok()
            } else {
                None
            };
            if let Some(images) = &images {
                log::debug!("image prefetch warmed {} entries", images.len());
            }
            render_prediction(&prediction, &format, images.as_ref());
            println!(
                "\nSaved to history ({} recent recording(s) kept)",
                session.history().entries().len()
            );
        }
        Err(e) => {
            eprintln!("Detection failed: {}", e);
            eprintln!("Tip: check the backend with: accent-detect status");
        }
    }

    session.go_home();
}

fn render_prediction(prediction: &Prediction, format: &OutputFormat, images: Option<&ImageCache>) {
    if matches!(format, OutputFormat::Json) {
        match serde_json::to_string_pretty(prediction) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize prediction: {}", e),
        }
        return;
    }

    println!();
    println!("Accent Detection Result:");
    println!("{:<16} {}", "Region:", prediction.region);
    println!("{:<16} {}", "Language:", prediction.language);
    println!(
        "{:<16} {:.0}%",
        "Confidence:",
        prediction.confidence * 100.0
    );
    if prediction.duration_ms > 0 {
        println!("{:<16} {}ms", "Duration:", prediction.duration_ms);
    }
    if !prediction.raw_state.is_empty() {
        println!("{:<16} {}", "State code:", prediction.raw_state);
    }

    println!("Characteristics:");
    for characteristic in &prediction.characteristics {
        println!("  - {}", characteristic);
    }

    if prediction.cuisines.is_empty() {
        println!("No cuisine recommendations available");
    } else {
        println!("Recommended Cuisines:");
        for cuisine in &prediction.cuisines {
            println!("  {} ({})", cuisine.name, cuisine.price);
            println!("    {}", cuisine.description);
            if let Some(image) = &cuisine.image {
                println!("    image: {}", describe_image(image, images));
            }
        }
    }
}

/// Pad-safe truncation for table cells; device names may be multi-byte
fn truncate_cell(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Render a cuisine image reference: embedded data, a cache hit, or a
/// direct cache-busted URL as the last resort
fn describe_image(image: &str, images: Option<&ImageCache>) -> String {
    if image.starts_with("data:") {
        return format!("embedded ({:.1}KB)", image.len() as f64 / 1024.0);
    }

    match images.and_then(|cache| cache.lookup(image)) {
        Some(entry) => match &entry.data_url {
            Some(data_url) => format!("cached inline ({:.1}KB)", data_url.len() as f64 / 1024.0),
            None => format!("cached: {}", entry.url),
        },
        None => match images {
            Some(cache) => cache.direct_url(image),
            None => image.to_string(),
        },
    }
}

async fn run_dish(backend_url: Option<&str>, region: &str) {
    let client = PredictionClient::new(backend_url);

    match client.dish_info(region).await {
        Ok(info) => {
            println!("Dish information for {}:", region);
            match serde_json::to_string_pretty(&info) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to render dish info: {}", e),
            }
        }
        Err(e) => {
            log::warn!("dish-info request failed: {}", e);
            match accents::profile_for_region(region) {
                Some(profile) => {
                    println!("Backend unavailable; showing bundled data for {}:", profile.region);
                    println!("{}", profile.cuisine.name);
                    println!("{}", profile.cuisine.description);
                    println!("Signature dishes: {}", profile.cuisine.dishes.join(", "));
                }
                None => {
                    eprintln!("No dish information available for region '{}'", region);
                }
            }
        }
    }
}
