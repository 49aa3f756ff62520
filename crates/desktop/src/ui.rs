//! Plain-text rendering for the terminal

use chrono::{DateTime, Utc};
use fishtracker_core::{CatalogProgress, Fish, LatestSighting, SeenFilter, SeenSet, Sighting};
use std::fmt::Write;

fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn format_position(latitude: f64, longitude: f64) -> String {
    format!("{:.4}, {:.4}", latitude, longitude)
}

fn latest_text(latest: Option<&LatestSighting>) -> String {
    match latest {
        Some(l) => format!(
            "last seen {} at {}",
            format_position(l.latitude, l.longitude),
            format_time(&l.timestamp)
        ),
        None => "never sighted".to_string(),
    }
}

/// `[x] fish-1  Blue Tang (RARE)  last seen ...`
pub fn fish_row(fish: &Fish, seen: bool) -> String {
    format!(
        "[{}] {}  {} ({})  {}",
        if seen { "x" } else { " " },
        fish.id,
        fish.name,
        fish.rarity.label(),
        latest_text(fish.latest_sighting.as_ref())
    )
}

pub fn progress_line(progress: &CatalogProgress) -> String {
    format!(
        "Spotted {} of {} fish ({}%), {} still to find",
        progress.seen, progress.total, progress.percent, progress.unseen
    )
}

pub fn render_list(fishes: &[&Fish], seen: &SeenSet, mode: SeenFilter, progress: &CatalogProgress) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", mode.label(), fishes.len());
    if fishes.is_empty() {
        let _ = writeln!(out, "No fish to show.");
    }
    for fish in fishes {
        let _ = writeln!(out, "{}", fish_row(fish, seen.contains(&fish.id)));
    }
    out.push_str(&progress_line(progress));
    out
}

pub fn render_detail(fish: &Fish, seen: bool, local_sightings: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", fish.name, fish.rarity.label());
    let _ = writeln!(out, "id: {}", fish.id);
    let _ = writeln!(out, "spotted: {}", if seen { "yes" } else { "no" });
    let _ = writeln!(out, "{}", latest_text(fish.latest_sighting.as_ref()));
    if !fish.image.is_empty() && !fish.image.starts_with("data:") {
        let _ = writeln!(out, "image: {}", fish.image);
    }
    let _ = writeln!(out, "your sightings: {}", local_sightings);
    if let Some(description) = &fish.description {
        let _ = writeln!(out);
        out.push_str(description);
    }
    out.trim_end().to_string()
}

pub fn sighting_row(sighting: &Sighting) -> String {
    let mut row = format!(
        "{}  {}  depth {} m  {} °C",
        format_time(&sighting.timestamp),
        format_position(sighting.latitude, sighting.longitude),
        sighting.depth,
        sighting.temperature
    );
    if let Some(name) = &sighting.photo_name {
        let _ = write!(row, "  photo: {}", name);
    }
    row
}

pub fn render_history(fish_id: &str, sightings: &[Sighting]) -> String {
    if sightings.is_empty() {
        return format!("No sightings recorded for {}", fish_id);
    }
    let mut out = format!("{} sighting(s) of {}", sightings.len(), fish_id);
    for sighting in sightings {
        out.push('\n');
        out.push_str(&sighting_row(sighting));
    }
    out
}
