use lrzero::{
    automaton::Automaton,
    grammar::{normalize_and_validate, RawGrammar},
    simulate::{Configuration, Phase, StepOutcome},
    table::{Action, ParseTable},
};

fn automaton(source: &str) -> Automaton {
    let raw = RawGrammar::from_text(source).unwrap();
    let (grammar, errors) = normalize_and_validate(&raw).unwrap();
    assert!(errors.is_empty(), "unexpected diagnostics: {:?}", errors);
    Automaton::build(grammar).unwrap()
}

fn run(automaton: &Automaton, sentence: &str) -> StepOutcome {
    let (_, outcome) = Configuration::from_sentence(sentence).run_to_completion(automaton, 1_000);
    outcome
}

#[test]
fn accepts_and_rejects_sentences_of_the_example_grammar() {
    let automaton = automaton("S -> B B\nB -> a B | b\n");

    assert_eq!(run(&automaton, "bb"), StepOutcome::Accept);
    assert_eq!(run(&automaton, "bab"), StepOutcome::Accept);
    assert_eq!(run(&automaton, "aabab"), StepOutcome::Accept);

    assert!(matches!(run(&automaton, "b"), StepOutcome::Stuck(_)));
    assert!(matches!(run(&automaton, "bba"), StepOutcome::Stuck(_)));
    assert!(matches!(run(&automaton, "x"), StepOutcome::Stuck(_)));
}

#[test]
fn accepts_right_recursive_lists() {
    let automaton = automaton("S -> a T\nT -> b T | c\n");

    assert_eq!(run(&automaton, "ac"), StepOutcome::Accept);
    assert_eq!(run(&automaton, "abbbc"), StepOutcome::Accept);
    assert!(matches!(run(&automaton, "abb"), StepOutcome::Stuck(_)));
}

#[test]
fn json_grammars_load_like_text_grammars() {
    let json = r#"{
        "name": "toy",
        "productions": [
            { "leftSide": "S", "rightSide": ["B B"] },
            { "leftSide": "B", "rightSide": ["a B", "b"] }
        ]
    }"#;
    let raw = RawGrammar::from_json(json).unwrap();
    assert_eq!(raw.name.as_deref(), Some("toy"));

    let built = Automaton::from_raw(&raw).unwrap();
    let reference = automaton("S -> B B\nB -> a B | b\n");
    assert_eq!(built.states().len(), reference.states().len());
    assert_eq!(built.end_id(), reference.end_id());
}

#[test]
fn table_and_stepper_agree_on_unambiguous_cells() {
    let automaton = automaton("S -> B B\nB -> a B | b\n");
    let table = ParseTable::derive(&automaton);
    let grammar = automaton.grammar();

    let mut config = Configuration::from_sentence("aabab");
    loop {
        let (next, outcome) = config.step(&automaton);
        if !outcome.is_continue() {
            assert_eq!(outcome, StepOutcome::Accept);
            break;
        }

        if config.phase() == Phase::AwaitingShiftOrReduce {
            let state = *config.state_stack().last().unwrap();
            let lookahead = config.remaining().next().unwrap().clone();
            let row = table.row(state);
            let cell = if lookahead.as_str() == "$" {
                row.end_actions()
            } else {
                row.action(&lookahead)
            };

            if let [action] = cell {
                match *action {
                    Action::Shift(target) => {
                        assert_eq!(next.state_stack().last(), Some(&target));
                        assert_eq!(next.symbol_stack().last(), Some(&lookahead));
                    }
                    Action::Reduce(production) => {
                        assert_eq!(next.phase(), Phase::CommittingGotoAfterReduce);
                        assert_eq!(
                            next.symbol_stack().last(),
                            Some(grammar.production(production).left()),
                        );
                    }
                    Action::Accept => unreachable!("accept is handled before the cell lookup"),
                }
            }
        }

        config = next;
    }
}

#[test]
fn blocked_validation_reports_every_problem_at_once() {
    let raw = RawGrammar::from_text("S -> A a\nA ->\nT -> b\n").unwrap();
    let (_, errors) = normalize_and_validate(&raw).unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.contains("multiple start symbol candidates")));
    assert!(errors.iter().any(|e| e.contains("`A'")));
}

#[test]
fn histories_of_configurations_replay_deterministically() {
    let automaton = automaton("S -> B B\nB -> a B | b\n");

    let mut history = vec![Configuration::from_sentence("bab")];
    loop {
        let (next, outcome) = history.last().unwrap().step(&automaton);
        history.push(next);
        if !outcome.is_continue() {
            break;
        }
    }

    // Stepping any retained snapshot again yields the same successor.
    for (snapshot, successor) in history.iter().zip(history.iter().skip(1)) {
        let (replayed, _) = snapshot.step(&automaton);
        assert_eq!(&replayed, successor);
    }
}
