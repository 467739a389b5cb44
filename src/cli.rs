//! Minimal CLI: schema + JSON documents → (check | normalize)
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value as Json;

use json_rec::codec;
use json_rec::ir::RecordType;
use json_rec::schema::Schema;
use json_rec::value::{json_kind, RecordValue};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against declared record types, or rewrite them in canonical form
#[derive(Parser, Debug)]
#[command(name = "json-rec", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode every document and report the first validation failure of each
    Check(CheckOut),
    /// decode then re-encode every document: declaration order, nulls filled in, unknown keys dropped
    Normalize(NormalizeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// schema file declaring enums and records
    #[arg(long, short)]
    schema: PathBuf,

    /// record to decode as (defaults to the schema's `root`)
    #[arg(long)]
    root: Option<String>,

    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct NormalizeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// pretty-print (ignored with --ndjson)
    #[arg(long)]
    pretty: bool,
}

/// One input document and where it came from (`path` or `path:line`).
/// Unparseable text is kept as the parse error so it is reported per document.
struct Document {
    origin: String,
    value: Result<Json, serde_json::Error>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn record_type(&self) -> Result<&'static RecordType> {
        let schema = Schema::load(&self.schema)?;
        Ok(schema.root(self.root.as_deref())?)
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            if self.ndjson {
                for (i, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let origin = format!("{source_path_str}:{}", i + 1);
                    out.push(Document { origin, value: serde_json::from_str::<Json>(line) });
                }
            } else {
                out.push(Document {
                    origin: source_path_str,
                    value: serde_json::from_str::<Json>(&source),
                });
            }
        }
        tracing::debug!(documents = out.len(), "loaded inputs");
        Ok(out)
    }
}

impl Document {
    fn decode(&self, ty: &'static RecordType) -> Result<RecordValue> {
        let value = match &self.value {
            Ok(value) => value,
            Err(error) => anyhow::bail!("failed to parse JSON: {error}"),
        };
        let Json::Object(map) = value else {
            anyhow::bail!("expected a JSON object, got {}", json_kind(Some(value)));
        };
        Ok(codec::decode(ty, map)?)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        let failed = self.execute(&mut std::io::stdout().lock(), &mut std::io::stderr().lock())?;
        Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    /// Run the command, writing results to `out` and the summary to `log`.
    /// Returns the number of documents that failed.
    fn execute(&self, out: &mut impl Write, log: &mut impl Write) -> Result<usize> {
        match &self.cmd {
            Command::Check(target) => {
                let ty = target.input_settings.record_type()?;
                let documents = target.input_settings.load_documents()?;
                let mut failed = 0usize;
                for doc in &documents {
                    match doc.decode(ty) {
                        Ok(_) => writeln!(out, "{} {}", "ok".green().bold(), doc.origin)?,
                        Err(error) => {
                            failed += 1;
                            writeln!(out, "{} {}: {error}", "error".red().bold(), doc.origin)?;
                        }
                    }
                }
                let summary = format!("{} passed, {failed} failed", documents.len() - failed);
                if failed == 0 {
                    writeln!(log, "{}", summary.green())?;
                } else {
                    writeln!(log, "{}", summary.red())?;
                }
                Ok(failed)
            }
            Command::Normalize(target) => {
                let settings = &target.input_settings;
                let ty = settings.record_type()?;
                let mut rendered = Vec::new();
                for doc in settings.load_documents()? {
                    let record = doc
                        .decode(ty)
                        .with_context(|| format!("cannot normalize {}", doc.origin))?;
                    let map = codec::encode(&record)?;
                    let text = if target.pretty && !settings.ndjson {
                        serde_json::to_string_pretty(&map)?
                    } else {
                        serde_json::to_string(&map)?
                    };
                    rendered.push(text);
                }
                let mut output = rendered.join("\n");
                output.push('\n');

                if let Some(path) = target.out.as_ref() {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, &output)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                } else {
                    out.write_all(output.as_bytes())?;
                }
                Ok(0)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }

    const SCHEMA: &str = r#"{
        "root": "Release",
        "enums": { "ReleaseType": ["lp", "cd", "download"] },
        "records": {
            "Release": [
                {"name": "artist", "type": "string"},
                {"name": "title", "type": "string"},
                {"name": "release_type", "type": "ReleaseType"},
                {"name": "release_date", "type": "date?"}
            ]
        }
    }"#;

    struct Workspace {
        dir: tempfile::TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            colored::control::set_override(false);
            let ws = Self { dir: tempfile::tempdir().unwrap() };
            ws.file("schema.json", SCHEMA);
            ws
        }

        fn file(&self, name: &str, contents: &str) -> String {
            let path = self.dir.path().join(name);
            std::fs::write(&path, contents).unwrap();
            path.to_string_lossy().to_string()
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).to_string_lossy().to_string()
        }

        /// Run with the given arguments after the subcommand's `--schema`.
        fn run(&self, subcommand: &str, args: &[&str]) -> (usize, String, String) {
            let schema = self.path("schema.json");
            let argv = ["json-rec", subcommand, "--schema", schema.as_str()]
                .into_iter()
                .chain(args.iter().copied());
            let cli = CommandLineInterface::try_parse_from(argv).unwrap();
            let (mut out, mut log) = (Vec::<u8>::new(), Vec::<u8>::new());
            let failed = cli.execute(&mut out, &mut log).unwrap();
            (failed, String::from_utf8(out).unwrap(), String::from_utf8(log).unwrap())
        }
    }

    #[test]
    fn check_reports_each_document_and_counts_failures() {
        let ws = Workspace::new();
        let good = ws.file(
            "good.json",
            r#"{"artist": "Destroyer", "title": "Kaputt", "release_type": "lp"}"#,
        );
        let bad = ws.file(
            "bad.json",
            r#"{"artist": "Destroyer", "title": 12, "release_type": "lp"}"#,
        );

        let (failed, out, log) = ws.run("check", &["-i", &good]);
        assert_eq!(failed, 0);
        assert_eq!(out, format!("ok {good}\n"));
        assert_eq!(log, "1 passed, 0 failed\n");

        let (failed, out, log) = ws.run("check", &["-i", &good, &bad]);
        assert_eq!(failed, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], format!("ok {good}"));
        assert!(lines[1].starts_with(&format!("error {bad}: field `title`")), "{out}");
        assert_eq!(log, "1 passed, 1 failed\n");
    }

    #[test]
    fn check_labels_ndjson_lines_and_survives_malformed_ones() {
        let ws = Workspace::new();
        let input = ws.file(
            "releases.ndjson",
            concat!(
                r#"{"artist": "A", "title": "One", "release_type": "cd"}"#,
                "\n",
                "{not json\n",
                "\n",
                r#"{"artist": "B", "title": "Two", "release_type": "laserdisc"}"#,
                "\n",
                r#"{"artist": "C", "title": "Three", "release_type": "download"}"#,
                "\n",
            ),
        );

        let (failed, out, _) = ws.run("check", &["--ndjson", "-i", &input]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4, "{out}");
        assert_eq!(lines[0], format!("ok {input}:1"));
        assert!(lines[1].starts_with(&format!("error {input}:2: failed to parse JSON")), "{out}");
        assert!(lines[2].starts_with(&format!("error {input}:4: field `release_type`")), "{out}");
        assert_eq!(lines[3], format!("ok {input}:5"));
        assert_eq!(failed, 2);
    }

    #[test]
    fn normalize_orders_fills_and_drops() {
        let ws = Workspace::new();
        let input = ws.file(
            "messy.ndjson",
            concat!(
                r#"{"release_type": "lp", "extra": true, "title": "Kaputt", "artist": "Destroyer"}"#,
                "\n",
                r#"{"title": "Labyrinthitis", "artist": "Destroyer", "release_type": "download", "release_date": "2022-03-25"}"#,
                "\n",
            ),
        );

        let (failed, out, _) = ws.run("normalize", &["--ndjson", "-i", &input]);
        assert_eq!(failed, 0);
        assert_eq!(
            out,
            concat!(
                r#"{"artist":"Destroyer","title":"Kaputt","release_type":"lp","release_date":null}"#,
                "\n",
                r#"{"artist":"Destroyer","title":"Labyrinthitis","release_type":"download","release_date":"2022-03-25"}"#,
                "\n",
            )
        );
    }

    #[test]
    fn normalize_writes_pretty_output_to_file() {
        let ws = Workspace::new();
        let input = ws.file("one.json", r#"{"title": "Kaputt", "artist": "Destroyer", "release_type": "lp"}"#);
        let target = ws.path("out/normalized.json");

        let (_, out, _) = ws.run("normalize", &["-i", &input, "-o", &target, "--pretty"]);
        assert!(out.is_empty());
        let written = std::fs::read_to_string(&target).unwrap();
        assert_eq!(
            written,
            "{\n  \"artist\": \"Destroyer\",\n  \"title\": \"Kaputt\",\n  \"release_type\": \"lp\",\n  \"release_date\": null\n}\n"
        );
    }

    #[test]
    fn normalize_stops_on_the_first_invalid_document() {
        let ws = Workspace::new();
        let input = ws.file("bad.json", r#"{"artist": "A", "title": "T", "release_type": "8-track"}"#);
        let schema = ws.path("schema.json");
        let cli = CommandLineInterface::try_parse_from([
            "json-rec",
            "normalize",
            "--schema",
            schema.as_str(),
            "-i",
            input.as_str(),
        ])
        .unwrap();
        let err = cli.execute(&mut Vec::<u8>::new(), &mut Vec::<u8>::new()).unwrap_err();
        assert!(format!("{err:#}").contains("cannot normalize"), "{err:#}");
    }
}
