//! Headless signup form.
//!
//! Drives a form the way a renderer would: keystrokes go through debounced
//! commits that the loop drains on its own thread, toggles commit
//! immediately, and the submit button reports where to scroll when the form
//! is blocked. Logs to `formwork-signup.log`.

use std::fs::File;
use std::time::Duration;

use formwork::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};

fn signup_form() -> Result<FormTree, FormError> {
    form![
        FormNode::section(vec![
            FormNode::row(vec![
                FieldDescriptor::text("first").label("First name").required().into(),
                FieldDescriptor::text("last").label("Last name").into(),
            ]),
            FieldDescriptor::text("email")
                .label("Email")
                .placeholder("you@example.com")
                .required()
                .rule(Email::new())
                .into(),
            FieldDescriptor::text("password")
                .label("Password")
                .secure()
                .required()
                .rule(MinLength::new(8))
                .into(),
        ])
        .title("Account"),
        FieldDescriptor::picker("plan", ["free", "pro", "team"])
            .label("Plan")
            .default_value(FieldValue::selection("free")),
        FormNode::when(
            |values| values.get("plan").is_some_and(|p| p.string_value() == "team"),
            vec![
                FormNode::card(vec![
                    FieldDescriptor::number("seats")
                        .label("Seats")
                        .required()
                        .range(Some(2.0), Some(500.0))
                        .into(),
                ])
                .title("Team")
                .style(CardStyle::Outlined),
            ],
        )
        .key("team"),
        FormNode::divider(),
        FieldDescriptor::toggle("terms")
            .label("I accept the terms")
            .rule(Custom::new("mustAccept", "Please accept the terms", |v| {
                v.bool_value()
            })),
    ]
}

fn report(form: &Form, outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Submitted(values) => {
            let mut keys: Vec<_> = values.keys().collect();
            keys.sort();
            println!("submitted: {:?}", keys);
        }
        SubmitOutcome::Blocked { scroll_to } => {
            println!("blocked, scroll to {:?}", scroll_to);
            for id in form.state().invalid_fields() {
                for error in form.state().errors(&id) {
                    println!("  {}: {}", id, error);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_file = File::create("formwork-signup.log")?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;

    let behavior = FormBehavior::default().debounce(Duration::from_millis(150));
    let mut form = Form::new(signup_form()?, behavior);
    form.mount();

    let _submitted = form.on_submit(|values| log::info!("signup with {} values", values.len()));
    let _validity = form.on_validation_changed(|valid| log::info!("form valid: {}", valid));

    let cx = form.context().clone();
    let field = |id: &str| form.field(id).ok_or_else(|| format!("no field '{}'", id));

    report(&form, &form.submit());

    for partial in ["a", "ad", "ada@", "ada@example.com"] {
        cx.commit_debounced(&field("email")?, FieldValue::text(partial));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cx.commit(&field("first")?, FieldValue::text("Ada"));
    cx.commit(&field("password")?, FieldValue::text("analytical"));
    cx.commit(&field("plan")?, FieldValue::selection("team"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("debounced commits applied: {}", cx.run_due());

    println!("team section active: {:?}", form.is_active("team"));
    report(&form, &form.submit());

    cx.commit(&field("seats")?, FieldValue::Number(12.0));
    cx.commit(&field("terms")?, FieldValue::Boolean(true));
    report(&form, &form.submit());

    form.unmount();
    Ok(())
}
