use std::sync::Arc;
use std::{fs, time::Instant};

use clap::Parser;

use shoco_rust::{model_header, Encoder};

#[derive(Parser, Debug)]
#[command(about = "Compress a file of short strings with a trained model")]
struct Args {
    /// Path of a model header; the bundled English model is used when absent
    #[arg(short = 'm', long = "model")]
    model: Option<String>,
    /// Source filename
    source_name: String,
    /// Destination filename
    dest_name: String,
}

fn main() {
    let args = Args::parse();

    let model = match &args.model {
        Some(path) => {
            let text = fs::read_to_string(path)
                .unwrap_or_else(|_| panic!("Could not read the model header {path}"));
            Arc::new(model_header::read_header(&text).expect("Failed parsing the model header"))
        }
        None => shoco_rust::default_model(),
    };

    let data = fs::read(&args.source_name).expect("Failed reading the source file");

    let comp_time = Instant::now();
    let compressed = Encoder::new(&model).encode_to_vec(&data);
    let comp_time = comp_time.elapsed().as_nanos() as f64;

    fs::write(&args.dest_name, &compressed).expect("Failed writing the compressed file");
    println!(
        "compressed {} bytes into {} in {}ns",
        data.len(),
        compressed.len(),
        comp_time
    );
}
