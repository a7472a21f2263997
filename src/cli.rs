//! automaton-canvas CLI - inspect and normalize automaton XML documents

use std::env;
use std::fs;
use std::process::ExitCode;

use automaton_canvas::config::EditorConfig;
use automaton_canvas::editor::Editor;

fn usage() {
    println!("automaton-canvas CLI - Automaton XML inspector");
    println!("Usage: automaton-canvas-cli <file.xml> [--normalize] [--style <style>]");
    println!();
    println!("Styles: detbuchiaut (default), nondetbuchiaut, buchigame, paritygame");
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut filename: Option<&str> = None;
    let mut normalize = false;
    let mut style = "detbuchiaut";

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--normalize" => normalize = true,
            "--style" => match iter.next() {
                Some(value) => style = value.as_str(),
                None => {
                    eprintln!("❌ --style needs a value");
                    return ExitCode::FAILURE;
                }
            },
            other => filename = Some(other),
        }
    }

    let Some(filename) = filename else {
        usage();
        return ExitCode::SUCCESS;
    };

    let config = match EditorConfig::default().with_style(style) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let content = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Could not read file '{}': {}", filename, e);
            return ExitCode::FAILURE;
        }
    };

    let mut editor = Editor::new(config);
    if let Err(e) = editor.load_xml(&content) {
        eprintln!("❌ Parse error: {}", e);
        return ExitCode::FAILURE;
    }

    let automaton = editor.automaton();
    println!("✅ Successfully loaded {} ({}):", filename, editor.style());
    println!();
    println!("  Alphabet: {}", automaton.alphabet().symbols().join(" "));
    println!("  States: {}", automaton.node_count());
    for node in automaton.nodes() {
        let mut flags = Vec::new();
        if node.initial {
            flags.push("initial");
        }
        if node.accepting {
            flags.push("accepting");
        }
        println!("    - {} at ({}, {}) {}", node.id, node.x, node.y, flags.join(", "));
    }
    println!("  Transitions: {}", automaton.edge_count());
    for (_, edge) in automaton.edges() {
        println!("    {} --> {} : {}", edge.source, edge.target, automaton.label(&edge.symbols));
    }

    if normalize {
        println!();
        print!("{}", editor.export_xml());
    }

    ExitCode::SUCCESS
}
