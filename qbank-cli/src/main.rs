// Command-line interface for qbank
//
// This binary drives the exam-content workflow against a generation backend
// and exposes the offline pieces (distribution planning, lesson rendering,
// export) directly.
//
// Network commands (structure, refine, generate, lessons, validate) talk to
// the backend configured under [api] in qbank.toml; offline commands (plan,
// render, export) never touch the network, except export's optional image
// inlining which can be disabled with --no-inline.
//
// Usage:
//  qbank structure <course> [-o FILE]
//  qbank refine --structure FILE --message TEXT [--reference FILE] [-o FILE]
//  qbank generate --structure FILE --subject NAME --topics A,B [--count N] [--images] [-o FILE]
//  qbank lessons --structure FILE [--all | --subject-idx N [--topic-idx A,B]] [-o FILE]
//  qbank add-images <questions.json> --course NAME [-o FILE]
//  qbank validate --input FILE --content-type TYPE --domain D --course C
//  qbank plan --count N [--blooms L=P,...] [--difficulty NAME=P,...]
//  qbank render <input.json|lesson.md> [--chapters A,B] [-o FILE]
//  qbank export <questions.json> --to json|markdown|html --course NAME [--no-inline] [--output-dir DIR]

use clap::{Arg, ArgAction, Command, ValueHint};
use qbank_config::{Loader, QbankConfig};
use qbank_core::api::{
    ApiClient, GenerateRequest, LessonRequest, RefineRequest, ValidateRequest,
};
use qbank_core::distribution::{matrix_counts, DistributionSpec};
use qbank_core::export::{export_filename, images, ExportDocument};
use qbank_core::formats::html::render_lesson_page;
use qbank_core::formats::html::serializer::HtmlOptions;
use qbank_core::model::{Lesson, Question};
use qbank_core::{FormatRegistry, Session};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn build_cli() -> Command {
    Command::new("qbank")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Assemble AI-generated question banks and lessons")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a qbank.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("structure")
                .about("Generate a course structure from a course name")
                .arg(
                    Arg::new("course")
                        .help("Course name, e.g. \"NEET PG\" or \"USMLE\"")
                        .required(true)
                        .index(1),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("refine")
                .about("Refine a course structure through the AI assistant")
                .arg(structure_arg())
                .arg(
                    Arg::new("message")
                        .long("message")
                        .short('m')
                        .help("Chat message describing the requested change")
                        .required(true),
                )
                .arg(
                    Arg::new("reference")
                        .long("reference")
                        .value_name("FILE")
                        .help("Reference document uploaded alongside the message")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate questions for selected topics")
                .arg(structure_arg())
                .arg(
                    Arg::new("subject")
                        .long("subject")
                        .help("Subject name within the structure")
                        .required(true),
                )
                .arg(
                    Arg::new("topics")
                        .long("topics")
                        .help("Comma-separated topic names")
                        .required(true),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .help("Questions per topic (5-50; defaults from config)")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("images")
                        .long("images")
                        .help("Ask the backend to attach images")
                        .action(ArgAction::SetTrue),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("lessons")
                .about("Generate lesson text for a structure")
                .arg(structure_arg())
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help("Generate lessons for every subject and topic")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("subject-idx")
                        .long("subject-idx")
                        .help("Subject index to generate for")
                        .value_parser(clap::value_parser!(usize))
                        .conflicts_with("all"),
                )
                .arg(
                    Arg::new("topic-idx")
                        .long("topic-idx")
                        .help("Comma-separated topic indices within the subject")
                        .requires("subject-idx"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("add-images")
                .about("Attach images to already-generated questions")
                .arg(
                    Arg::new("input")
                        .help("questions .json file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("course")
                        .long("course")
                        .help("Course the questions belong to")
                        .required(true),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Score generated content through the validation endpoint")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .help("JSON file with the items to validate")
                        .required(true)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("content-type")
                        .long("content-type")
                        .help("Item kind, e.g. questions or lessons")
                        .required(true),
                )
                .arg(
                    Arg::new("domain")
                        .long("domain")
                        .help("Content domain, e.g. medical")
                        .required(true),
                )
                .arg(
                    Arg::new("course")
                        .long("course")
                        .help("Course the content belongs to")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Compute a question-count distribution without the backend")
                .long_about(
                    "Compute the integer question plan for a requested count.\n\n\
                    Without weights the count is split evenly over Bloom's levels\n\
                    1-5. Percentages do not need to sum to 100; they are\n\
                    normalized first.\n\n\
                    Examples:\n  \
                    qbank plan --count 17\n  \
                    qbank plan --count 20 --blooms 3=50,4=30,5=20\n  \
                    qbank plan --count 100 --blooms 1=20,2=20,3=20,4=20,5=20 \\\n             \
                    --difficulty easy=30,medium=40,hard=30",
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .help("Total question count to distribute")
                        .required(true)
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("blooms")
                        .long("blooms")
                        .help("Bloom's weighting as level=percent pairs, e.g. 1=20,2=30"),
                )
                .arg(
                    Arg::new("difficulty")
                        .long("difficulty")
                        .help("Difficulty weighting as name=percent pairs, e.g. easy=30,hard=70"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Render questions or a lesson to HTML, offline")
                .arg(
                    Arg::new("input")
                        .help("questions/lessons .json file or a lesson .md file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("chapters")
                        .long("chapters")
                        .help("Comma-separated chapter names for cross-reference rewriting"),
                )
                .arg(
                    Arg::new("course")
                        .long("course")
                        .help("Course name shown in the document header")
                        .default_value("QBank"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Export questions to a downloadable document")
                .arg(
                    Arg::new("input")
                        .help("questions .json file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format: json, markdown or html")
                        .required(true),
                )
                .arg(
                    Arg::new("course")
                        .long("course")
                        .help("Course name used in the header and filename")
                        .required(true),
                )
                .arg(
                    Arg::new("no-inline")
                        .long("no-inline")
                        .help("Skip image inlining (keep URL references)")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .value_name("DIR")
                        .help("Directory for the exported file (defaults from config)")
                        .value_hint(ValueHint::DirPath),
                ),
        )
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_name("FILE")
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn structure_arg() -> Arg {
    Arg::new("structure")
        .long("structure")
        .value_name("FILE")
        .help("Course structure JSON file")
        .required(true)
        .value_hint(ValueHint::FilePath)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    pretty_env_logger::init();
    let matches = build_cli().get_matches();
    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));

    match matches.subcommand() {
        Some(("structure", sub)) => {
            let course = sub.get_one::<String>("course").expect("course is required");
            handle_structure_command(course, output_of(sub), &config).await;
        }
        Some(("refine", sub)) => {
            let structure = sub
                .get_one::<String>("structure")
                .expect("structure is required");
            let message = sub.get_one::<String>("message").expect("message is required");
            let reference = sub.get_one::<String>("reference").map(|s| s.as_str());
            handle_refine_command(structure, message, reference, output_of(sub), &config).await;
        }
        Some(("generate", sub)) => {
            let structure = sub
                .get_one::<String>("structure")
                .expect("structure is required");
            let subject = sub.get_one::<String>("subject").expect("subject is required");
            let topics = sub.get_one::<String>("topics").expect("topics is required");
            let count = sub.get_one::<u32>("count").copied();
            let images = sub.get_flag("images");
            handle_generate_command(
                structure,
                subject,
                topics,
                count,
                images,
                output_of(sub),
                &config,
            )
            .await;
        }
        Some(("lessons", sub)) => {
            let structure = sub
                .get_one::<String>("structure")
                .expect("structure is required");
            let all = sub.get_flag("all");
            let subject_idx = sub.get_one::<usize>("subject-idx").copied();
            let topic_idx = sub.get_one::<String>("topic-idx").map(|s| s.as_str());
            handle_lessons_command(structure, all, subject_idx, topic_idx, output_of(sub), &config)
                .await;
        }
        Some(("add-images", sub)) => {
            let input = sub.get_one::<String>("input").expect("input is required");
            let course = sub.get_one::<String>("course").expect("course is required");
            handle_add_images_command(input, course, output_of(sub), &config).await;
        }
        Some(("validate", sub)) => {
            let input = sub.get_one::<String>("input").expect("input is required");
            let content_type = sub
                .get_one::<String>("content-type")
                .expect("content-type is required");
            let domain = sub.get_one::<String>("domain").expect("domain is required");
            let course = sub.get_one::<String>("course").expect("course is required");
            handle_validate_command(input, content_type, domain, course, &config).await;
        }
        Some(("plan", sub)) => {
            let count = *sub.get_one::<u32>("count").expect("count is required");
            let blooms = sub.get_one::<String>("blooms").map(|s| s.as_str());
            let difficulty = sub.get_one::<String>("difficulty").map(|s| s.as_str());
            handle_plan_command(count, blooms, difficulty);
        }
        Some(("render", sub)) => {
            let input = sub.get_one::<String>("input").expect("input is required");
            let chapters = sub.get_one::<String>("chapters").map(|s| s.as_str());
            let course = sub.get_one::<String>("course").expect("course has a default");
            handle_render_command(input, chapters, course, output_of(sub));
        }
        Some(("export", sub)) => {
            let input = sub.get_one::<String>("input").expect("input is required");
            let to = sub.get_one::<String>("to").expect("to is required");
            let course = sub.get_one::<String>("course").expect("course is required");
            let no_inline = sub.get_flag("no-inline");
            let output_dir = sub.get_one::<String>("output-dir").map(|s| s.as_str());
            handle_export_command(input, to, course, no_inline, output_dir, &config).await;
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn output_of(sub: &clap::ArgMatches) -> Option<&str> {
    sub.get_one::<String>("output").map(|s| s.as_str())
}

fn load_cli_config(explicit_path: Option<&str>) -> QbankConfig {
    let loader = Loader::new().with_optional_file("qbank.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn api_client(config: &QbankConfig) -> ApiClient {
    ApiClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )
    .unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    })
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn write_output(output: Option<&str>, content: &str) {
    match output {
        Some(path) => {
            fs::write(path, content).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
            eprintln!("Wrote {path}");
        }
        None => println!("{content}"),
    }
}

fn load_session(structure_path: &str) -> Session {
    let raw = read_file(structure_path);
    let mut session = Session::new();
    session.load_structure_json(&raw).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });
    session
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error encoding JSON: {e}");
        std::process::exit(1);
    })
}

/// Parse "key=percent,key=percent" weight lists.
fn parse_weights(raw: &str) -> Vec<(String, f64)> {
    let mut weights = Vec::new();
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((key, value)) = pair.split_once('=') else {
            eprintln!("Error: weight '{pair}' is not in key=percent form");
            std::process::exit(1);
        };
        let percent: f64 = value.trim().parse().unwrap_or_else(|_| {
            eprintln!("Error: percentage '{}' is not a number", value.trim());
            std::process::exit(1);
        });
        weights.push((key.trim().to_string(), percent));
    }
    if weights.is_empty() {
        eprintln!("Error: no weights given");
        std::process::exit(1);
    }
    weights
}

fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn handle_structure_command(course: &str, output: Option<&str>, config: &QbankConfig) {
    let api = api_client(config);
    let structure = api.generate_subjects(course).await.unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });
    eprintln!(
        "Structure for '{}': {} subjects, {} topics",
        structure.course,
        structure.subjects.len(),
        structure.topic_count()
    );
    write_output(output, &to_pretty_json(&structure));
}

async fn handle_refine_command(
    structure_path: &str,
    message: &str,
    reference: Option<&str>,
    output: Option<&str>,
    config: &QbankConfig,
) {
    let mut session = load_session(structure_path);
    let structure = session.structure().expect("structure just loaded").clone();
    if let Some(path) = reference {
        session.attach_reference(PathBuf::from(path));
    }

    let api = api_client(config);
    let request = RefineRequest {
        course: structure.course.clone(),
        message: message.to_string(),
        current_structure: structure,
        reference_doc: session.reference_doc().cloned(),
    };
    let response = api.refine_structure(&request).await.unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    println!("{}", response.response);
    match response.updated_structure {
        Some(updated) => {
            session.apply_refinement(updated.clone()).unwrap_or_else(|err| {
                eprintln!("Error: {err}");
                std::process::exit(1);
            });
            write_output(output, &to_pretty_json(&updated));
        }
        None => eprintln!("No structure changes proposed."),
    }
}

async fn handle_generate_command(
    structure_path: &str,
    subject: &str,
    topics_raw: &str,
    count: Option<u32>,
    images: bool,
    output: Option<&str>,
    config: &QbankConfig,
) {
    let count = count.unwrap_or(config.generate.questions_per_topic);
    if !config.generate.count_in_range(count) {
        eprintln!(
            "Error: questions per topic must be between {} and {}",
            config.generate.min_questions, config.generate.max_questions
        );
        std::process::exit(1);
    }

    let mut session = load_session(structure_path);
    let structure = session.structure().expect("structure just loaded").clone();
    if structure.subject(subject).is_none() {
        let available: Vec<&str> = structure.subjects.iter().map(|s| s.name.as_str()).collect();
        eprintln!(
            "Error: subject '{subject}' not found in structure (available: {})",
            available.join(", ")
        );
        std::process::exit(1);
    }
    let topics = parse_name_list(topics_raw);
    if topics.is_empty() {
        eprintln!("Error: no topics selected");
        std::process::exit(1);
    }

    print_distribution_preview(count, &structure);

    session.approve_structure().unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    let api = api_client(config);
    let request = GenerateRequest {
        course: structure.course.clone(),
        subject: subject.to_string(),
        topics,
        num_questions: count,
        include_images: images || config.generate.include_images,
        exam_format: structure.exam_format.clone(),
    };
    let response = api.generate(&request).await.unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    let flagged = response
        .questions
        .iter()
        .filter(|q| q.validate().is_err())
        .count();
    if flagged > 0 {
        eprintln!("Warning: {flagged} question(s) have a correct option missing from their options");
    }

    let questions = response.questions;
    session.record_questions(questions.clone()).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });
    eprintln!("Generated {} questions", questions.len());
    write_output(output, &to_pretty_json(&questions));
}

fn print_distribution_preview(count: u32, structure: &qbank_core::model::CourseStructure) {
    let format = structure.exam_format.as_ref();
    match format {
        Some(f) if f.difficulty_distribution.is_some() => {
            match DistributionSpec::blooms_by_difficulty(count, f) {
                Ok(matrix) => eprintln!("Requested distribution per topic:\n{matrix}"),
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
        _ => match DistributionSpec::blooms(count, format) {
            Ok(spec) => eprintln!("Requested distribution per topic:\n{spec}"),
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        },
    }
}

async fn handle_lessons_command(
    structure_path: &str,
    all: bool,
    subject_idx: Option<usize>,
    topic_idx: Option<&str>,
    output: Option<&str>,
    config: &QbankConfig,
) {
    if !all && subject_idx.is_none() {
        eprintln!("Error: pass --all or --subject-idx to select what to generate");
        std::process::exit(1);
    }
    let session = load_session(structure_path);
    let structure = session.structure().expect("structure just loaded").clone();
    if let Some(idx) = subject_idx {
        if idx >= structure.subjects.len() {
            eprintln!(
                "Error: subject index {idx} out of range ({} subjects)",
                structure.subjects.len()
            );
            std::process::exit(1);
        }
    }
    let selected_topic_indices = topic_idx.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<usize>().unwrap_or_else(|_| {
                    eprintln!("Error: topic index '{s}' is not a number");
                    std::process::exit(1);
                })
            })
            .collect::<Vec<_>>()
    });

    let api = api_client(config);
    let request = LessonRequest {
        course: structure.course.clone(),
        uploaded_json: structure,
        generate_all: all,
        selected_subject_idx: subject_idx,
        selected_topic_indices,
        selected_chapters: None,
    };
    let response = api.generate_lessons(&request).await.unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    eprintln!(
        "Generated {} lesson(s) for '{}'",
        response.lessons.len(),
        response.course
    );
    write_output(output, &to_pretty_json(&response.lessons));
}

async fn handle_add_images_command(
    input: &str,
    course: &str,
    output: Option<&str>,
    config: &QbankConfig,
) {
    let questions: Vec<Question> =
        serde_json::from_str(&read_file(input)).unwrap_or_else(|e| {
            eprintln!("Error: '{input}' is not a question list: {e}");
            std::process::exit(1);
        });
    let api = api_client(config);
    let response = api.add_images(&questions, course).await.unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });
    if !response.success {
        eprintln!("Warning: backend reported a failure while attaching images");
    }
    let attached = response
        .questions
        .iter()
        .filter(|q| q.image_url.is_some())
        .count();
    eprintln!("{attached}/{} questions carry an image", response.questions.len());
    write_output(output, &to_pretty_json(&response.questions));
}

async fn handle_validate_command(
    input: &str,
    content_type: &str,
    domain: &str,
    course: &str,
    config: &QbankConfig,
) {
    let items: Vec<serde_json::Value> =
        serde_json::from_str(&read_file(input)).unwrap_or_else(|e| {
            eprintln!("Error: '{input}' is not a JSON array: {e}");
            std::process::exit(1);
        });
    let api = api_client(config);
    let request = ValidateRequest {
        content_type: content_type.to_string(),
        items,
        domain: domain.to_string(),
        course: course.to_string(),
    };
    let report = api.validate_content(&request).await.unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    for item in &report.results {
        let index = item.index.map(|i| i.to_string()).unwrap_or_default();
        let verdict = item.verdict.as_deref().unwrap_or("-");
        let score = item
            .score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!("item {index}: {verdict} (score {score})");
        for issue in &item.issues {
            println!("  - {issue}");
        }
    }
    if let Some(summary) = &report.summary {
        if let Some(avg) = summary.average_score {
            println!("average score: {avg:.1}");
        }
        if let (Some(passed), Some(failed)) = (summary.passed, summary.failed) {
            println!("passed: {passed}, failed: {failed}");
        }
        if let Some(notes) = &summary.notes {
            println!("{notes}");
        }
    }
}

fn handle_plan_command(count: u32, blooms: Option<&str>, difficulty: Option<&str>) {
    match (blooms, difficulty) {
        (Some(blooms), Some(difficulty)) => {
            let rows = parse_weights(blooms);
            let cols = parse_weights(difficulty);
            match matrix_counts(count, &rows, &cols) {
                Ok(matrix) => println!("{matrix}"),
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
        (Some(weights), None) | (None, Some(weights)) => {
            match DistributionSpec::weighted(count, &parse_weights(weights)) {
                Ok(spec) => println!("{spec}"),
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
        (None, None) => match DistributionSpec::blooms(count, None) {
            Ok(spec) => println!("{spec}"),
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        },
    }
}

fn handle_render_command(
    input: &str,
    chapters: Option<&str>,
    course: &str,
    output: Option<&str>,
) {
    let source = read_file(input);
    let html = if input.ends_with(".json") {
        let doc = if let Ok(questions) = serde_json::from_str::<Vec<Question>>(&source) {
            ExportDocument::from_questions(course, None, &[], questions)
        } else if let Ok(lessons) = serde_json::from_str::<Vec<Lesson>>(&source) {
            ExportDocument::from_lessons(course, None, lessons)
        } else {
            eprintln!("Error: '{input}' is neither a question list nor a lesson list");
            std::process::exit(1);
        };
        let registry = FormatRegistry::default();
        registry.serialize(&doc, "html").unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            std::process::exit(1);
        })
    } else {
        let chapter_names = chapters.map(parse_name_list).unwrap_or_default();
        let title = Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Lesson".to_string());
        render_lesson_page(&title, &source, &chapter_names, &HtmlOptions::default())
            .unwrap_or_else(|err| {
                eprintln!("Error: {err}");
                std::process::exit(1);
            })
    };
    write_output(output, &html);
}

async fn handle_export_command(
    input: &str,
    to: &str,
    course: &str,
    no_inline: bool,
    output_dir: Option<&str>,
    config: &QbankConfig,
) {
    let mut questions: Vec<Question> =
        serde_json::from_str(&read_file(input)).unwrap_or_else(|e| {
            eprintln!("Error: '{input}' is not a question list: {e}");
            std::process::exit(1);
        });

    let registry = FormatRegistry::default();
    let format = registry.get(to).unwrap_or_else(|err| {
        eprintln!("Error: {err} (available: {})", registry.list_formats().join(", "));
        std::process::exit(1);
    });

    if to == "markdown" && config.export.inline_images && !no_inline {
        let stats = images::inline_images(&mut questions).await;
        if stats.attempted > 0 {
            eprintln!(
                "Inlined {}/{} images ({} kept as links)",
                stats.inlined, stats.attempted, stats.failed
            );
        }
    }

    let doc = ExportDocument::from_questions(course, None, &[], questions);
    let text = format.serialize(&doc).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    let dir = output_dir.unwrap_or(config.export.output_dir.as_str());
    let filename = export_filename("questions", course, format.file_extension());
    let path = Path::new(dir).join(filename);
    fs::write(&path, text).unwrap_or_else(|e| {
        eprintln!("Error writing file '{}': {e}", path.display());
        std::process::exit(1);
    });
    println!("{}", path.display());
}
