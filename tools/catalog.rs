use std::env;
use std::path::PathBuf;

use library::config::{config_path_from_env, load_or_create_config};
use library::{Library, ScanOptions, SaveReport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: catalog <scan [folder...] | remove <song-id...> | forget <scan-id> | clear | stats | folders>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Wrote default config to {:?}", config_path);
    }
    let library = Library::open(config.library_options(&config_path))?;

    let mut args = env::args().skip(1);
    let command = args.next().ok_or(USAGE)?;
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "scan" => {
            let folders: Vec<PathBuf> = if rest.is_empty() {
                config.scan_folder_paths(&config_path)
            } else {
                rest.iter().map(PathBuf::from).collect()
            };
            if folders.is_empty() {
                return Err("no folders given and scan_folders is empty".into());
            }
            let options = ScanOptions {
                resort_library: config.resort_on_scan,
                ..ScanOptions::default()
            };
            for folder in folders {
                let summary = library.scan_folder(&folder, &options, |progress| {
                    if progress.done {
                        return;
                    }
                    if progress.current_index % 100 == 0 {
                        info!(
                            "{}/{} files in {}",
                            progress.current_index, progress.total_files_count, progress.path
                        );
                    }
                })?;
                report_saves(&summary.saves);
                println!(
                    "{}: {} scanned, {} skipped (scan id {})",
                    folder.display(),
                    summary.scanned,
                    summary.skipped,
                    summary.scan_id
                );
            }
        }
        "remove" => {
            if rest.is_empty() {
                return Err(USAGE.into());
            }
            let summary = library.remove_songs(&rest)?;
            report_saves(&summary.saves);
            println!(
                "Removed {} songs, deleted {} artworks",
                summary.removed.len(),
                summary.deleted_artworks.len()
            );
        }
        "forget" => {
            let scan_id = rest.first().ok_or(USAGE)?;
            let summary = library.delete_entities_by_scan_id(scan_id)?;
            report_saves(&summary.saves);
            println!("Removed {} songs", summary.removed.len());
        }
        "clear" => {
            report_saves(&library.initialize_library()?);
            println!("Library cleared");
        }
        "stats" => {
            let stats = library.stats()?;
            println!(
                "Indexed: {} artists, {} albums, {} songs",
                stats.artists, stats.albums, stats.songs
            );
        }
        "folders" => {
            for folder in library.scanned_folders()? {
                println!(
                    "{}\t{}\t{} songs",
                    folder.id, folder.path, folder.scanned_songs_count
                );
            }
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn report_saves(report: &SaveReport) {
    for kind in report.failed() {
        warn!("{} was not saved", kind);
    }
}
