use approx::assert_relative_eq;

use fuzzy_rulebase::{Engine, EngineConfig, Error, Section, TupleNotation, ValidationIssue};

const FUZZY_SETS: &str = "\
#FuzzySets
Temp
Cold(0,10,5,5)
Hot(20,35,5,5)
Fan
Slow(0,20,5,5)
Fast(40,60,5,5)
Heater
Off(0,10,5,5)
On(30,40,5,5)
";

fn document(rulebase: &str, measurements: &str) -> String {
    format!("{FUZZY_SETS}\n#Rulebase\n{rulebase}\n#Measurements\n{measurements}\n")
}

#[test]
fn test_hot_room() {
    let text = document("Cooling\nRule1: if Temp is Hot then Fan is Fast", "Temp = 30");
    let report = Engine::default().run_text(&text).unwrap();

    assert_eq!(report.outputs.len(), 1);

    let output = &report.outputs[0];

    assert_eq!(output.name, "cooling");
    assert_eq!(output.consequent, "fan");
    assert_relative_eq!(output.result.as_ref().unwrap().value(), 50., epsilon = 1e-9);
}

#[test]
fn test_negated_consequent_is_excluded() {
    let text = document(
        "Cooling\nRule1: if Temp is Hot then Fan is Fast\nRule2: if Temp is Hot then Fan is not Slow",
        "Temp = 30",
    );
    let report = Engine::default().run_text(&text).unwrap();
    let outputs = report.outputs[0].result.as_ref().unwrap();

    assert!(matches!(
        &report.diagnostics[..],
        [Error::NegatedConsequent { variable, .. }] if variable == "fan"
    ));
    assert_eq!(outputs.strengths().len(), 1);
    assert_relative_eq!(outputs.value(), 50., epsilon = 1e-9);
}

#[test]
fn test_rule_base_without_valid_rules_has_no_output() {
    let text = document(
        "Cooling\nRule1: if Temp is Hot then Fan is Fast\nBroken\nRule1: if Humidity is High then Fan is Fast",
        "Temp = 30",
    );
    let report = Engine::default().run_text(&text).unwrap();
    let broken = report.output("broken", "fan").unwrap();

    assert_eq!(
        broken.result,
        Err(Error::NoValidRules {
            rule_base: "broken".into()
        })
    );
    assert!(matches!(&report.diagnostics[..], [Error::UnresolvedTerm { .. }]));
    assert!(report.output("cooling", "fan").unwrap().result.is_ok());
}

#[test]
fn test_several_consequents() {
    let text = document(
        "Cooling\nRule1: if Temp is Hot then Fan is Fast\nHeating\nRule1: if Temp is Hot then Heater is Off",
        "Temp = 30",
    );
    let report = Engine::default().run_text(&text).unwrap();
    let fan = report.output("cooling", "fan").unwrap();
    let heater = report.output("heating", "heater").unwrap();

    assert_relative_eq!(fan.result.as_ref().unwrap().value(), 50., epsilon = 1e-9);
    assert_relative_eq!(heater.result.as_ref().unwrap().value(), 5., epsilon = 1e-9);

    let vars = heater.variables.as_ref().unwrap();

    assert_eq!(vars[vars.consequent()].name(), "heater");
    assert_eq!(vars[vars.consequent()].universe().lower(), -5.);
    assert_eq!(vars[vars.consequent()].universe().upper(), 45.);
}

#[test]
fn test_breakpoint_notation_matches_spread() {
    let text = "\
#FuzzySets
Temp
Hot(15,20,35,40)
Fan
Fast(35,40,60,65)
#Rulebase
Cooling
Rule1: if Temp is Hot then Fan is Fast
#Measurements
Temp = 17.5
";
    let engine = Engine::new(EngineConfig {
        step: 0.5,
        notation: TupleNotation::Breakpoints,
    });
    let report = engine.run_text(text).unwrap();
    let outputs = report.outputs[0].result.as_ref().unwrap();

    assert_relative_eq!(outputs.strengths()[0], 0.5);
    assert_relative_eq!(outputs.value(), 50., epsilon = 1e-9);
    assert!(outputs.aggregated().iter().all(|&(_, mu)| mu <= 0.5));
}

#[test]
fn test_missing_section() {
    let err = Engine::default()
        .run_text("#FuzzySets\nTemp\nCold(0,10,5,5)\n#Rulebase\n")
        .unwrap_err();

    assert_eq!(err, Error::MissingSection(Section::Measurements));
    assert!(err.is_fatal());
}

#[test]
fn test_invalid_document() {
    let text = document("Cooling\nRule1: if Temp is Hot then Fan is Fast", "Temp = 30\nFan = 50\nHeater = 1");
    let Err(Error::Validation(errors)) = Engine::default().run_text(&text) else {
        panic!("expected a validation error");
    };

    assert_eq!(
        errors.issues(),
        &[ValidationIssue::TooManyMeasurements {
            variables: 3,
            measurements: 3
        }]
    );
}

#[test]
fn test_bank_loan() {
    let text = "\
#FuzzySets
Score
High(175,190,5,0)
Low(155,170,0,5)
Ratio
Good(0.3,0.4,0,0.02)
Bad(0.45,0.7,0.01,0)
Credit
Good(0,3,0,2)
Bad(5,10,2,0)
Decision
Reject(0,2,0,3)
Approve(8,10,3,0)

#Rulebase
Loans
Rule1: if score is high and ratio is good and credit is good then decision is approve
Rule2: if score is low and ratio is bad or credit is bad then decision is reject

#Measurements
Score = 185
Ratio = 0.39
Credit = 1.5
";
    let report = Engine::default().run_text(text).unwrap();
    let outputs = report.output("loans", "decision").unwrap().result.as_ref().unwrap();

    assert!(matches!(
        &report.diagnostics[..],
        [Error::MixedConnectives { used, .. }] if used.to_string() == "and"
    ));
    assert_eq!(outputs.strengths(), &[1., 0.]);
    // Approve ramps 5..8 then stays at 1 up to 10
    assert_relative_eq!(outputs.value(), 101. / 12., epsilon = 1e-9);
}

#[test]
fn test_huge_consequent_universe_fails_its_rule_base() {
    let text = "\
#FuzzySets
Temp
Hot(20,35,5,5)
Any(0,1e300,0,0)
Fan
Fast(0,1e300,0,0)
Valve
Open(40,60,5,5)
#Rulebase
Cooling
Rule1: if Temp is Hot then Fan is Fast
Venting
Rule1: if Temp is Any then Valve is Open
#Measurements
Temp = 30
";
    let report = Engine::default().run_text(text).unwrap();
    let cooling = report.output("cooling", "fan").unwrap();

    assert!(matches!(
        &cooling.result,
        Err(Error::UniverseTooLarge { variable, .. }) if variable == "fan"
    ));
    assert!(cooling.variables.is_none());

    // A wide antecedent is fuzzified without sampling its universe
    let venting = report.output("venting", "valve").unwrap();

    assert_relative_eq!(venting.result.as_ref().unwrap().value(), 50., epsilon = 1e-9);
}

#[test]
fn test_variables_without_fuzzy_sets_are_not_counted() {
    let text = "\
#FuzzySets
Temp
Hot(20,35,5,5)
Fan
Fast(40,60,5,5)
Pressure
#Rulebase
Cooling
Rule1: if Temp is Hot then Fan is Fast
#Measurements
Temp = 30
Pressure = 3
";
    let Err(Error::Validation(errors)) = Engine::default().run_text(text) else {
        panic!("expected a validation error");
    };

    assert_eq!(
        errors.issues(),
        &[ValidationIssue::TooManyMeasurements {
            variables: 2,
            measurements: 2
        }]
    );
}
