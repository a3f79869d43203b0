use std::{fs, time::Instant};

use clap::Parser;

use shoco_rust::model_header;
use shoco_rust::trainer::{self, SplitMode, StripMode, TrainOptions};

#[derive(Parser, Debug)]
#[command(about = "Train a short-string compression model from a text corpus")]
struct TrainerArgs {
    /// The corpus files to train on
    #[arg(required = true)]
    corpus: Vec<String>,
    /// Destination path of the generated model
    #[arg(short = 'o', long = "output", default_value = "model.h")]
    output: String,
    /// Where to cut the corpus into training segments
    #[arg(long = "split", value_enum, default_value_t = SplitMode::Newline)]
    split: SplitMode,
    /// Which byte classes to trim from both segment ends
    #[arg(long = "strip", value_enum, default_value_t = StripMode::Whitespace)]
    strip: StripMode,
    /// Bits of a code word addressing the leading character table
    #[arg(long = "max-leading-char-bits", default_value_t = 5)]
    max_leading_char_bits: u32,
    /// Bits of a code word addressing a successor table row
    #[arg(long = "max-successor-bits", default_value_t = 4)]
    max_successor_bits: u32,
    /// How many pack layouts to generate (1 to 3)
    #[arg(short = 'e', long = "encoding-types", default_value_t = 3)]
    encoding_types: usize,
    /// Search the corpus for the best pack layouts instead of the canonical ones
    #[arg(short = 'O', long = "optimize-encoding")]
    optimize_encoding: bool,
    /// JSON file with training options, overriding the individual flags
    #[arg(long = "config")]
    config: Option<String>,
    /// Dump the model as JSON instead of a C header
    #[arg(long = "json")]
    json: bool,
}

fn main() {
    let args = TrainerArgs::parse();

    let options = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .unwrap_or_else(|_| panic!("Could not read the options file {path}"));
            serde_json::from_str::<TrainOptions>(&raw).expect("Failed parsing the options file")
        }
        None => TrainOptions {
            leading_bits: args.max_leading_char_bits,
            successor_bits: args.max_successor_bits,
            encoding_types: args.encoding_types,
            optimize_encoding: args.optimize_encoding,
            split: args.split,
            strip: args.strip,
        },
    };

    let mut corpus = Vec::new();
    for path in &args.corpus {
        let data =
            fs::read(path).unwrap_or_else(|_| panic!("Could not read the corpus file {path}"));
        corpus.extend_from_slice(&data);
        corpus.push(b'\n');
    }

    let train_time = Instant::now();
    let model = trainer::train(&corpus, &options).expect("Training failed");
    let train_time = train_time.elapsed().as_nanos() as f64;

    let text = if args.json {
        serde_json::to_string_pretty(&model).expect("Failed serializing the model")
    } else {
        model_header::write_header(&model)
    };
    fs::write(&args.output, text).expect("Failed writing the model");

    println!(
        "trained a model on {} corpus bytes in {}ns",
        corpus.len(),
        train_time
    );
}
