use humanly_lib::api::extract_text;
use humanly_lib::models::ScoreResult;
use humanly_lib::services::score;
use serde::Serialize;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    file: String,
    extracted_chars: usize,
    #[serde(flatten)]
    result: ScoreResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let out_path = parse_arg_value(&args, "--out");
    let paths: Vec<&String> = args
        .iter()
        .skip(1)
        .filter(|a| !a.starts_with("--") && Some(*a) != out_path.as_ref())
        .collect();

    if paths.is_empty() {
        eprintln!(
            "Usage:\n  cargo run --bin score_file -- <file.pdf|.docx|.txt>... [--out <json_path>]\n\nNotes:\n  - Prints the machine-likelihood score and sub-score breakdown per file.\n  - Set HUMANLY_DISABLE_FILE_LOG=1 to skip the session log file."
        );
        return Ok(());
    }

    humanly_lib::init_logging();

    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path).map_err(|e| anyhow::anyhow!("read {} failed: {}", path, e))?;
        let file_name = std::path::Path::new(path)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());

        let text = extract_text(&file_name, bytes).await?;
        let result = score(&text);
        let b = &result.breakdown;

        println!("File: {}", path);
        println!("Extracted: {} chars, {} words", text.chars().count(), result.word_count);
        println!("Preview: {}", preview(&text, 120));
        println!("Score: {:.2}", result.score);
        println!(
            "  burstiness={} lexical={} formality={} starters={} buzzwords={} phrases={} damping={}",
            b.burstiness, b.lexical, b.formality, b.starters, b.buzzwords, b.phrases, b.damping
        );
        let signals: Vec<String> = result
            .signals
            .iter()
            .filter_map(|s| serde_json::to_value(s).ok())
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        println!("Signals: {}", if signals.is_empty() { "(none)".to_string() } else { signals.join(", ") });
        println!();

        reports.push(FileReport {
            file: path.clone(),
            extracted_chars: text.chars().count(),
            result,
        });
    }

    if let Some(out_path) = out_path {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(&out_path, json).map_err(|e| anyhow::anyhow!("write out failed: {}", e))?;
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
