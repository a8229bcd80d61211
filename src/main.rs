use anyhow::{bail, Context, Result};
use humanly_lib::api::{extract_text, score_text, update_api_key, HumanizeInput, HumanlyService, UploadedFile};
use humanly_lib::services::{CancelToken, ConfigStore, RandomSource, SplitMix64};
use std::io::{IsTerminal, Read};
use std::path::Path;
use tracing::info;

const USAGE: &str = "Usage:
  humanly [--text <text> | --file <path.pdf|.docx|.txt>] [options]
  echo \"text\" | humanly [options]

Options:
  --threshold <0-100>   target score (default from config, 30)
  --attempts <1-20>     assisted rewrite budget (default from config, 10)
  --style <name>        professional | casual | formal | simple | academic
  --mode <name>         light | balanced | aggressive | creative
  --seed <n>            fixed seed for the rule-based steps
  --score-only          print the score breakdown without rewriting
  --health              print service health and exit
  --set-api-key <key>   save the LLM API key to the config file and exit
  --delete-api-key      remove the stored LLM API key and exit
  --out <json_path>     also write the JSON result to a file

Environment:
  LLM_API_KEY / HUMANLY_LLM_API_KEY, HUMANLY_LLM_API_URL, HUMANLY_LLM_MODEL
  HUMANLY_DISABLE_FILE_LOG=1, HUMANLY_LOG_DIR, RUST_LOG";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn parse_opt<T>(args: &[String], key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match parse_arg_value(args, key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(None),
    }
}

fn read_upload(path: &str) -> Result<UploadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("read file failed: {}", path))?;
    let name = Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    Ok(UploadedFile { name, bytes })
}

fn read_stdin() -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf).context("read stdin failed")?;
    Ok(Some(buf))
}

fn emit(json: String, out_path: Option<&str>) -> Result<()> {
    println!("{}", json);
    if let Some(out_path) = out_path {
        std::fs::write(out_path, &json).with_context(|| format!("write out failed: {}", out_path))?;
        info!("Wrote JSON: {}", out_path);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    humanly_lib::init_logging();

    let set_key = parse_arg_value(&args, "--set-api-key");
    if set_key.is_some() || has_flag(&args, "--delete-api-key") {
        let store = ConfigStore::open_default().context("no config directory on this platform")?;
        update_api_key(&store, set_key.as_deref())?;
        println!("Updated {}", store.config_file().display());
        return Ok(());
    }

    let out_path = parse_arg_value(&args, "--out");
    let service = HumanlyService::from_environment();

    if has_flag(&args, "--health") {
        return emit(serde_json::to_string_pretty(&service.health())?, out_path.as_deref());
    }

    let file = parse_arg_value(&args, "--file").map(|p| read_upload(&p)).transpose()?;
    let text = match parse_arg_value(&args, "--text") {
        Some(t) => Some(t),
        None if file.is_none() => read_stdin()?,
        None => None,
    };
    if text.as_deref().map_or(true, |t| t.trim().is_empty()) && file.is_none() {
        eprintln!("{}", USAGE);
        bail!("no input: pass --text, --file or pipe text on stdin");
    }

    if has_flag(&args, "--score-only") {
        let content = match (&text, &file) {
            (Some(t), _) if !t.trim().is_empty() => t.clone(),
            (_, Some(f)) => extract_text(&f.name, f.bytes.clone()).await?,
            _ => String::new(),
        };
        let result = score_text(content.trim());
        return emit(serde_json::to_string_pretty(&result)?, out_path.as_deref());
    }

    let input = HumanizeInput {
        text,
        file,
        threshold: parse_opt(&args, "--threshold")?,
        max_attempts: parse_opt(&args, "--attempts")?,
        style: parse_arg_value(&args, "--style"),
        mode: parse_arg_value(&args, "--mode"),
    };

    let mut rng: Box<dyn RandomSource> = match parse_opt::<u64>(&args, "--seed")? {
        Some(seed) => Box::new(SplitMix64::seeded(seed)),
        None => Box::new(SplitMix64::from_entropy()),
    };

    // Ctrl-C stops the assisted loop after the current attempt.
    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing with the best result so far");
            on_signal.cancel();
        }
    });

    let response = service
        .humanize_with(input, rng.as_mut(), Some(&cancel))
        .await?;

    emit(serde_json::to_string_pretty(&response)?, out_path.as_deref())
}
