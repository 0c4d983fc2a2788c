//! Score a small team and print its balance report

use enneagram_core::{AssessmentProcessor, QuestionSet, Response};

fn main() {
    let questions_json = r#"[
        { "id": 1, "text": "I hold myself to high standards.", "type": 1 },
        { "id": 2, "text": "I notice what others need.", "type": 2 },
        { "id": 3, "text": "I am driven to succeed.", "type": 3 },
        { "id": 4, "text": "I feel things deeply.", "type": 4 },
        { "id": 5, "text": "I prefer to observe before acting.", "type": 5 },
        { "id": 6, "text": "I anticipate what could go wrong.", "type": 6 },
        { "id": 7, "text": "I rarely get bored.", "type": 7, "reverse": true },
        { "id": 8, "text": "I take charge naturally.", "type": 8 },
        { "id": 9, "text": "I avoid conflict.", "type": 9 }
    ]"#;

    let questions = match QuestionSet::from_json(questions_json) {
        Ok(questions) => questions,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let team = [
        ("Ana", [5, 2, 3, 1, 1, 2, 4, 3, 2]),
        ("Ben", [2, 2, 5, 3, 1, 2, 4, 3, 2]),
        ("Caro", [1, 2, 2, 3, 5, 4, 3, 1, 2]),
        ("Dev", [2, 1, 3, 2, 3, 2, 1, 5, 3]),
    ];

    let mut processor = AssessmentProcessor::new(questions);
    for (name, answers) in team {
        let responses: Vec<Response> = answers
            .iter()
            .enumerate()
            .map(|(i, &value)| Response::new(i as u32 + 1, value))
            .collect();

        match processor.submit(name, Some("Design"), &responses) {
            Ok(result) => println!(
                "{:<5} type {} wing {}",
                result.display_name, result.primary_type, result.wing
            ),
            Err(e) => eprintln!("{name}: {e}"),
        }
    }

    match processor
        .team_report("design")
        .and_then(|report| Ok(serde_json::to_string_pretty(&report)?))
    {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
