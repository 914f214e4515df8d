//! Terminal rendering for dispatch responses. All presentation lives here;
//! the library only hands back structured data.

use chrono::{DateTime, Utc};
use console::style;
use mediakitapp::dispatch::Response;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

/// Field values wider than this get truncated in list views.
const VALUE_WIDTH: usize = 60;

pub fn print_entity(response: &Response) {
    let data = match &response.data {
        Some(d) => d,
        None => return,
    };

    let kind = data["kind"].as_str().unwrap_or("?");
    let quality = data["quality"].as_str().unwrap_or("?");
    println!(
        "{} — quality: {}",
        style(kind).bold(),
        styled_rating(quality)
    );

    if let Some(fields) = data["fields"].as_array() {
        for field in fields {
            let key = field["key"].as_str().unwrap_or("?");
            let value = field["value"].as_str().unwrap_or("");
            let source = match field["source"].as_str() {
                Some("entry") => style("[A]").dim().to_string(),
                Some("meta") => style("[B]").dim().to_string(),
                _ => "   ".to_string(),
            };
            let shown = if value.is_empty() {
                style("—").dim().to_string()
            } else {
                truncate(value, VALUE_WIDTH)
            };
            println!("  {:<12} {} {}", style(key).cyan(), shown, source);
        }
    }
}

pub fn print_save(response: &Response) {
    if let Some(message) = &response.message {
        if response.success {
            println!("{}", style(message).green());
        } else {
            println!("{}", style(message).red());
        }
    }

    let data = match &response.data {
        Some(d) => d,
        None => return,
    };

    if let Some(phases) = data["phases"].as_array() {
        let trail: Vec<&str> = phases.iter().filter_map(|p| p.as_str()).collect();
        println!("{}", style(trail.join(" -> ")).dim());
    }

    // Surface skipped-field warnings from the service.
    if let Some(messages) = data["result"]["messages"].as_array() {
        for m in messages {
            if let Some(content) = m["content"].as_str() {
                println!("{}", style(content).yellow());
            }
        }
    }
}

pub fn print_sync(response: &Response) {
    let data = match &response.data {
        Some(d) => d,
        None => return,
    };

    let first = data["first"].as_str().unwrap_or("?");
    let second = data["second"].as_str().unwrap_or("?");
    if data["in_sync"].as_bool().unwrap_or(false) {
        let lag = data["lag_seconds"].as_i64().unwrap_or(0);
        println!(
            "{} {} and {} are in sync (lag {}s)",
            style("✓").green(),
            first,
            second,
            lag
        );
    } else {
        println!(
            "{} {} and {} are out of sync",
            style("✗").red(),
            first,
            second
        );
    }

    for (label, key) in [(first, "first_stamp"), (second, "second_stamp")] {
        match data[key].as_str() {
            Some(raw) => println!("  {} updated {}", label, humanize(raw)),
            None => println!("  {} has no sync stamp", label),
        }
    }

    print_issue_lists(data);
}

pub fn print_health(response: &Response) {
    let data = match &response.data {
        Some(d) => d,
        None => return,
    };

    let overall = data["overall"].as_str().unwrap_or("?");
    let score = data["score"].as_u64().unwrap_or(0);
    println!("health: {} ({}/100)", styled_rating(overall), score);

    let breakdown = &data["breakdown"];
    for (label, key) in [
        ("association", "association"),
        ("topics", "primary_quality"),
        ("questions", "secondary_quality"),
        ("sync", "sync"),
    ] {
        println!(
            "  {:<12} {:>2}/25",
            style(label).dim(),
            breakdown[key].as_u64().unwrap_or(0)
        );
    }

    print_issue_lists(data);
}

pub fn print_error(response: &Response) {
    if let Some(message) = &response.message {
        eprintln!("{} {}", style("Error:").red().bold(), message);
    }
}

fn print_issue_lists(data: &Value) {
    if let Some(issues) = data["issues"].as_array() {
        for issue in issues {
            if let Some(text) = issue.as_str() {
                println!("  {} {}", style("!").yellow(), text);
            }
        }
    }
    if let Some(recs) = data["recommendations"].as_array() {
        for rec in recs {
            if let Some(text) = rec.as_str() {
                println!("  {} {}", style("→").cyan(), text);
            }
        }
    }
}

fn styled_rating(rating: &str) -> String {
    match rating {
        "excellent" | "good" => style(rating).green().to_string(),
        "fair" => style(rating).yellow().to_string(),
        _ => style(rating).red().to_string(),
    }
}

/// Humanize an RFC 3339 stamp relative to now ("3 minutes ago").
fn humanize(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(when) => {
            let elapsed = Utc::now().signed_duration_since(when.with_timezone(&Utc));
            match elapsed.to_std() {
                Ok(d) => timeago::Formatter::new().convert(d),
                Err(_) => "just now".to_string(),
            }
        }
        Err(_) => raw.to_string(),
    }
}

fn truncate(value: &str, max_width: usize) -> String {
    if value.width() <= max_width {
        return value.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in value.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw > max_width.saturating_sub(1) {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}
