use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use gifdecode::Gif;

/// Loads a GIF file and prints its decoded structure.
#[derive(Parser)]
#[command(version, about = "Loads and displays the decoded structure of a GIF file.")]
struct Args {
    /// Input file name
    file: String,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let data = match std::fs::read(&args.file) {
        Ok(data) => data,
        Err(e) => {
            let _ = writeln!(io::stderr(), "cannot read {}: {}", args.file, e);
            return ExitCode::FAILURE;
        }
    };

    match Gif::parse(&data) {
        Ok(gif) => {
            print_gif(&gif);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = writeln!(io::stderr(), "cannot decode {}: {}", args.file, e);
            ExitCode::FAILURE
        }
    }
}

fn print_gif(gif: &Gif) {
    println!("GIF image:");
    println!("  Version: {:?}", gif.version);
    println!("  Logical screen: {}x{}", gif.width, gif.height);
    match &gif.global_color_table {
        Some(t) => println!(
            "  Global color table: {} colors (background index {})",
            t.num_colors(),
            gif.bg_index
        ),
        None => println!("  Global color table: none"),
    }
    println!("  Frames: {}", gif.images.len());

    for (i, image) in gif.images.iter().enumerate() {
        println!("  Frame {}:", i);
        println!("    Position: ({}, {})", image.x, image.y);
        println!("    Size: {}x{}", image.width, image.height);
        match &image.local_color_table {
            Some(t) => println!("    Local color table: {} colors", t.num_colors()),
            None => println!("    Local color table: none"),
        }
        match &image.graphic_control {
            Some(gc) => {
                println!("    Disposal method: {:?}", gc.disposal_method);
                println!("    Delay: {} ms", gc.delay_time_ms());
                match gc.transparent_index {
                    Some(idx) => println!("    Transparent index: {}", idx),
                    None => println!("    Transparent index: none"),
                }
            }
            None => println!("    Graphic control: none"),
        }
    }
}
