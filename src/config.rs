use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::resolver::FALLBACK_ANSWER;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "workgpt-gateway")]
#[command(about = "Question-answering gateway with a persistent answer cache over Gemini")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8081)]
    pub port: u16,

    // Which persistent store backs the answer cache
    #[arg(long, value_enum, default_value_t = StoreBackend::File)]
    pub store: StoreBackend,

    // Flat-file backend: path to the questions file
    #[arg(long, default_value = "questions.json")]
    pub questions_file: PathBuf,

    // Sqlite backend: path to the database
    #[arg(long, default_value = "workgpt.db")]
    pub db_path: PathBuf,

    // Gemini API base URL (point at a stub for local testing)
    #[arg(long, default_value = crate::gemini::GEMINI_API_BASE)]
    pub gemini_url: String,

    #[arg(long, default_value = "gemini-1.5-pro")]
    pub model: String,

    // Exact-match cache keys instead of case-insensitive
    #[arg(long)]
    pub case_sensitive: bool,

    // Surface generation/store failures as 502 instead of the canned answer
    #[arg(long)]
    pub no_fallback: bool,

    #[arg(long, default_value = FALLBACK_ANSWER)]
    pub fallback_answer: String,

    // De-duplicate concurrent generation calls for the same question
    #[arg(long)]
    pub single_flight: bool,

    // Geolocation service for the activity log (sqlite backend only)
    #[arg(long, default_value = "http://ip-api.com/json")]
    pub geo_url: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Sqlite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_deployment() {
        let args = Args::parse_from(["workgpt-gateway"]);
        assert_eq!(args.port, 8081);
        assert_eq!(args.store, StoreBackend::File);
        assert_eq!(args.questions_file, PathBuf::from("questions.json"));
        assert!(!args.case_sensitive);
        assert!(!args.no_fallback);
        assert!(!args.single_flight);
        assert_eq!(args.fallback_answer, FALLBACK_ANSWER);
    }

    #[test]
    fn test_sqlite_backend_selectable() {
        let args = Args::parse_from(["workgpt-gateway", "--store", "sqlite", "--db-path", "/tmp/x.db"]);
        assert_eq!(args.store, StoreBackend::Sqlite);
        assert_eq!(args.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_flags_toggle() {
        let args = Args::parse_from([
            "workgpt-gateway",
            "--case-sensitive",
            "--no-fallback",
            "--single-flight",
        ]);
        assert!(args.case_sensitive);
        assert!(args.no_fallback);
        assert!(args.single_flight);
    }
}
