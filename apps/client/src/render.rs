//! Terminal output for profiles and videos

use chrono::Local;
use prettytable::{Cell, Row, Table};

use crate::api::{Profile, Video};

pub fn print_profile(profile: &Profile) {
    println!("\n👤 {} {}", profile.firstname, profile.lastname);
    println!("   ID: {}", profile.id);
    println!("   Email: {}", profile.email);
    println!("   Mobile: {}", profile.mobile);
    println!("   Bio: {}", profile.bio.as_deref().unwrap_or("-"));
    println!(
        "   Picture: {}",
        profile.profile_picture.as_deref().unwrap_or("-")
    );
    println!(
        "   Logged in before: {}",
        if profile.email_registered { "yes" } else { "no" }
    );

    if profile.videos.is_empty() {
        println!("\n📭 No videos yet.\n");
        return;
    }

    println!("\n🎬 Videos ({})\n", profile.videos.len());
    videos_table(&profile.videos).printstd();
    println!();
}

pub fn print_users(profiles: &[Profile]) {
    if profiles.is_empty() {
        println!("📭 No users found.");
        return;
    }

    println!("\n📋 Users ({})\n", profiles.len());
    users_table(profiles).printstd();
    println!();
}

pub fn print_video(video: &Video) {
    println!("   ID: {}", video.id);
    println!("   Title: {}", video.title);
    println!("   Video: {}", video.video_url);
    println!("   Thumbnail: {}", video.thumbnail_url);
}

fn users_table(profiles: &[Profile]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Name"),
        Cell::new("Email"),
        Cell::new("Bio"),
        Cell::new("Videos"),
    ]));

    for profile in profiles {
        table.add_row(Row::new(vec![
            Cell::new(&profile.id),
            Cell::new(&format!("{} {}", profile.firstname, profile.lastname)),
            Cell::new(&profile.email),
            Cell::new(profile.bio.as_deref().unwrap_or("-")),
            Cell::new(&profile.videos.len().to_string()),
        ]));
    }

    table
}

fn videos_table(videos: &[Video]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Title"),
        Cell::new("Description"),
        Cell::new("Uploaded"),
        Cell::new("Video"),
    ]));

    for video in videos {
        let uploaded = video.created_at.with_timezone(&Local);
        table.add_row(Row::new(vec![
            Cell::new(&video.title),
            Cell::new(&video.description),
            Cell::new(&uploaded.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(&video.video_url),
        ]));
    }

    table
}
