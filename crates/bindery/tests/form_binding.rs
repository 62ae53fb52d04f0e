//! End-to-end binder scenarios: a registration form, write-through editing,
//! record construction, and property-set driven forms.

use std::cell::RefCell;
use std::rc::Rc;

use bindery::{
    Binder, BinderError, HasPropertySet, InputField, InstanceField, PropertyError,
    PropertySetBuilder, RangeValidator, RecordComponents, RecordSchema, StringToNumber,
    TrimConverter, ValidationResult, ValueContext, WriteRecordError, from_fn, not_blank,
};
use bindery::Field as _;

#[derive(Debug, Clone, PartialEq, Default)]
struct Registration {
    username: String,
    email: String,
    age: i32,
}

struct RegistrationForm {
    username: InputField<String>,
    email: InputField<String>,
    age: InputField<String>,
    binder: Binder<Registration>,
}

fn registration_form() -> RegistrationForm {
    let username = InputField::new(String::new()).with_label("Username");
    let email = InputField::new(String::new()).with_label("E-mail");
    let age = InputField::new(String::new()).with_label("Age");

    let binder = Binder::<Registration>::new();
    binder
        .for_field(&username)
        .with_converter(TrimConverter)
        .with_validator(not_blank("username is required"))
        .bind(|r| r.username.clone(), |r, v| r.username = v);
    binder
        .for_field(&email)
        .with_validator(from_fn(|v: &String, _: &ValueContext| {
            if v.contains('@') {
                ValidationResult::ok()
            } else {
                ValidationResult::error("not an e-mail address")
            }
        }))
        .bind(|r| r.email.clone(), |r, v| r.email = v);
    binder
        .for_field(&age)
        .with_converter(StringToNumber::<i32>::new("age must be a number"))
        .with_validator(RangeValidator::at_least("must be at least 18", 18))
        .bind(|r| r.age, |r, v| r.age = v);

    RegistrationForm {
        username,
        email,
        age,
        binder,
    }
}

#[test]
fn registration_form_happy_path() {
    let form = registration_form();
    form.username.set_value("  ada  ".to_owned());
    form.email.set_value("ada@example.com".to_owned());
    form.age.set_value("36".to_owned());

    let mut reg = Registration::default();
    form.binder.write_bean(&mut reg).unwrap();
    assert_eq!(
        reg,
        Registration {
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            age: 36,
        }
    );
    // The trimming converter normalized the field content on commit.
    assert_eq!(form.username.value(), "ada");
}

#[test]
fn every_failure_is_collected_not_just_the_first() {
    let form = registration_form();
    form.email.set_value("nope".to_owned());
    form.age.set_value("seventeen".to_owned());

    let mut reg = Registration::default();
    let err = form.binder.write_bean(&mut reg).unwrap_err();
    // Blank username, bad e-mail, unparseable age.
    assert_eq!(err.field_errors().len(), 3);
    assert_eq!(reg, Registration::default());

    assert_eq!(
        form.username.invalid_message().as_deref(),
        Some("username is required")
    );
    assert_eq!(
        form.email.invalid_message().as_deref(),
        Some("not an e-mail address")
    );
    assert_eq!(
        form.age.invalid_message().as_deref(),
        Some("age must be a number")
    );
}

#[test]
fn fixing_the_input_clears_the_error_display() {
    let form = registration_form();
    form.age.set_value("nope".to_owned());
    form.binder.validate();
    assert!(form.age.invalid_message().is_some());

    form.age.set_value("20".to_owned());
    // Editing a field on a bean-less binder revalidates just that binding.
    assert_eq!(form.age.invalid_message(), None);
}

#[test]
fn validator_order_first_failure_wins() {
    let form = registration_form();
    form.username.set_value("ada".to_owned());
    form.email.set_value("ada@example.com".to_owned());
    form.age.set_value("17".to_owned());
    let status = form.binder.validate();
    let errors = status.field_errors();
    assert_eq!(errors.len(), 1); // the age parses but fails the range check
    let age_error = errors
        .iter()
        .find(|s| s.label() == Some("Age"))
        .expect("age status");
    assert_eq!(age_error.message(), Some("must be at least 18"));
}

#[test]
fn read_bean_then_selective_write() {
    let form = registration_form();
    let stored = Registration {
        username: "ada".to_owned(),
        email: "ada@example.com".to_owned(),
        age: 36,
    };
    form.binder.read_bean(&stored);
    assert_eq!(form.age.value(), "36");
    assert!(!form.binder.has_changes());

    form.age.set_value("37".to_owned());
    assert!(form.binder.has_changes());

    let mut other = Registration {
        username: "grace".to_owned(),
        email: "grace@example.com".to_owned(),
        age: 0,
    };
    form.binder
        .write_changed_bindings_to_bean(&mut other)
        .unwrap();
    assert_eq!(other.username, "grace"); // untouched
    assert_eq!(other.age, 37);
}

// ---------------------------------------------------------------------------
// Write-through editing with an attached bean
// ---------------------------------------------------------------------------

#[test]
fn attached_bean_commits_on_each_valid_edit() {
    let form = registration_form();
    form.binder.set_bean(Registration {
        username: "ada".to_owned(),
        email: "ada@example.com".to_owned(),
        age: 36,
    });

    form.age.set_value("37".to_owned());
    assert_eq!(form.binder.bean().unwrap().age, 37);

    form.age.set_value("old".to_owned());
    assert_eq!(form.binder.bean().unwrap().age, 37);
    assert!(form.age.invalid_message().is_some());

    form.age.set_value("38".to_owned());
    assert_eq!(form.binder.bean().unwrap().age, 38);
    assert_eq!(form.age.invalid_message(), None);
}

#[test]
fn remove_bean_stops_write_through() {
    let form = registration_form();
    form.binder.set_bean(Registration {
        username: "ada".to_owned(),
        email: "ada@example.com".to_owned(),
        age: 36,
    });
    let detached = form.binder.remove_bean().unwrap();
    assert_eq!(detached.age, 36);

    form.age.set_value("99".to_owned());
    assert!(!form.binder.has_bean());
    assert!(form.binder.has_changes());
}

#[test]
fn bean_validator_rolls_back_the_attached_bean_too() {
    let form = registration_form();
    let binder = form.binder.clone().with_validator(from_fn(
        |r: &Registration, _: &ValueContext| {
            if r.username == "root" {
                ValidationResult::error("that name is reserved")
            } else {
                ValidationResult::ok()
            }
        },
    ));
    binder.set_bean(Registration {
        username: "ada".to_owned(),
        email: "ada@example.com".to_owned(),
        age: 36,
    });

    form.username.set_value("root".to_owned());
    // Field-level validation passed, the bean-level validator rejected, and
    // the write was rolled back.
    assert_eq!(binder.bean().unwrap().username, "ada");
}

// ---------------------------------------------------------------------------
// Change reversion
// ---------------------------------------------------------------------------

#[test]
fn equality_predicate_reverts_without_global_change_detection() {
    let name = InputField::new(String::new());
    let binder = Binder::<Registration>::new();
    binder
        .for_field(&name)
        .with_equality_predicate(|a: &String, b: &String| a.eq_ignore_ascii_case(b))
        .bind(|r| r.username.clone(), |r, v| r.username = v);
    binder.read_bean(&Registration {
        username: "Ada".to_owned(),
        ..Registration::default()
    });

    name.set_value("ADA".to_owned());
    // Case-insensitively equal to the snapshot, so not a change.
    assert!(!binder.has_changes());

    name.set_value("Grace".to_owned());
    assert!(binder.has_changes());
}

// ---------------------------------------------------------------------------
// Required and optional values
// ---------------------------------------------------------------------------

#[test]
fn required_binding_rejects_the_empty_value() {
    let name = InputField::new(String::new());
    let binder = Binder::<Registration>::new();
    let binding = binder
        .for_field(&name)
        .as_required("enter a username")
        .bind(|r| r.username.clone(), |r, v| r.username = v);
    assert!(name.is_required_indicator_visible());

    let status = binding.validate(false);
    assert_eq!(status.message(), Some("enter a username"));

    name.set_value("ada".to_owned());
    assert!(binding.validate(false).results().is_empty());

    binding.set_as_required_enabled(false);
    assert!(!name.is_required_indicator_visible());
    name.set_value(String::new());
    assert!(binding.validate(false).results().is_empty());
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Profile {
    nickname: Option<String>,
}

#[test]
fn null_representation_maps_empty_to_none() {
    let nickname = InputField::new(String::new());
    let binder = Binder::<Profile>::new();
    binder
        .for_field(&nickname)
        .with_null_representation(String::new())
        .bind(|p| p.nickname.clone(), |p, v| p.nickname = v);

    let mut profile = Profile {
        nickname: Some("speed".to_owned()),
    };
    binder.read_bean(&profile);
    assert_eq!(nickname.value(), "speed");

    nickname.set_value(String::new());
    binder.write_bean(&mut profile).unwrap();
    assert_eq!(profile.nickname, None);

    nickname.set_value("turbo".to_owned());
    binder.write_bean(&mut profile).unwrap();
    assert_eq!(profile.nickname, Some("turbo".to_owned()));
}

// ---------------------------------------------------------------------------
// Read-only control
// ---------------------------------------------------------------------------

#[test]
fn getter_only_binding_cannot_be_made_writable() {
    let display = InputField::new(String::new());
    let binder = Binder::<Registration>::new();
    let binding = binder
        .for_field(&display)
        .bind_read_only(|r: &Registration| r.username.clone());

    assert!(binding.is_read_only());
    let err = binding.set_read_only(false).unwrap_err();
    assert!(matches!(err, BinderError::NoSetter { .. }));

    // And it never writes, even when the binder does.
    display.set_value("sneaky".to_owned());
    let mut reg = Registration::default();
    binder.write_bean(&mut reg).unwrap();
    assert_eq!(reg.username, "");
}

#[test]
fn unbind_detaches_the_field() {
    let name = InputField::new(String::new());
    let binder = Binder::<Registration>::new();
    let binding = binder
        .for_field(&name)
        .bind(|r| r.username.clone(), |r, v| r.username = v);
    let shown = format!("{binding:?}");
    assert!(shown.starts_with("Binding"));

    binding.unbind();
    name.set_value("ghost".to_owned());
    assert!(!binder.has_changes());

    let mut reg = Registration::default();
    binder.write_bean(&mut reg).unwrap();
    assert_eq!(reg.username, "");
}

// ---------------------------------------------------------------------------
// Record mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Interval {
    start: i32,
    end: i32,
}

fn interval_schema() -> RecordSchema<Interval> {
    RecordSchema::new(|c: &RecordComponents| Interval {
        start: c.get("start"),
        end: c.get("end"),
    })
    .component::<i32>("start")
    .component::<i32>("end")
}

#[test]
fn record_binder_constructs_fresh_values() {
    let start = InputField::new(String::new());
    let end = InputField::new(String::new());
    let binder = Binder::for_record(interval_schema());
    binder
        .for_field(&start)
        .with_converter(StringToNumber::<i32>::new("bad start"))
        .bind_record_component("start", |i: &Interval| i.start)
        .unwrap();
    binder
        .for_field(&end)
        .with_converter(StringToNumber::<i32>::new("bad end"))
        .bind_record_component("end", |i: &Interval| i.end)
        .unwrap();

    // A template record loads the fields.
    binder.read_bean(&Interval { start: 1, end: 5 });
    assert_eq!(start.value(), "1");

    end.set_value("9".to_owned());
    let interval = binder.write_record().unwrap();
    assert_eq!(interval, Interval { start: 1, end: 9 });
}

#[test]
fn unbound_component_fails_before_validation() {
    let start = InputField::new(String::new());
    let binder = Binder::for_record(interval_schema());
    binder
        .for_field(&start)
        .with_converter(StringToNumber::<i32>::new("bad start"))
        .bind_record_component("start", |i: &Interval| i.start)
        .unwrap();

    let err = binder.write_record().unwrap_err();
    assert!(matches!(err, WriteRecordError::MissingComponent(name) if name == "end"));
}

#[test]
fn unknown_component_is_rejected_at_bind_time() {
    let middle = InputField::new(String::new());
    let binder = Binder::for_record(interval_schema());
    let err = binder
        .for_field(&middle)
        .with_converter(StringToNumber::<i32>::new("bad"))
        .bind_record_component("middle", |i: &Interval| i.start)
        .unwrap_err();
    assert!(matches!(err, BinderError::UnknownRecordComponent { .. }));
}

#[test]
fn record_level_validator_discards_the_candidate() {
    let start = InputField::new(String::new());
    let end = InputField::new(String::new());
    let binder = Binder::for_record(interval_schema()).with_validator(from_fn(
        |i: &Interval, _: &ValueContext| {
            if i.start <= i.end {
                ValidationResult::ok()
            } else {
                ValidationResult::error("start must not exceed end")
            }
        },
    ));
    binder
        .for_field(&start)
        .with_converter(StringToNumber::<i32>::new("bad start"))
        .bind_record_component("start", |i: &Interval| i.start)
        .unwrap();
    binder
        .for_field(&end)
        .with_converter(StringToNumber::<i32>::new("bad end"))
        .bind_record_component("end", |i: &Interval| i.end)
        .unwrap();

    start.set_value("7".to_owned());
    end.set_value("3".to_owned());
    let err = binder.write_record().unwrap_err();
    let WriteRecordError::Invalid(exception) = err else {
        panic!("expected a validation failure");
    };
    assert_eq!(
        exception.bean_errors()[0].message(),
        Some("start must not exceed end")
    );

    end.set_value("30".to_owned());
    assert!(binder.write_record().is_ok());
}

#[test]
fn invalid_component_input_blocks_construction() {
    let start = InputField::new(String::new());
    let end = InputField::new(String::new());
    let binder = Binder::for_record(interval_schema());
    binder
        .for_field(&start)
        .with_converter(StringToNumber::<i32>::new("bad start"))
        .bind_record_component("start", |i: &Interval| i.start)
        .unwrap();
    binder
        .for_field(&end)
        .with_converter(StringToNumber::<i32>::new("bad end"))
        .bind_record_component("end", |i: &Interval| i.end)
        .unwrap();

    start.set_value("x".to_owned());
    end.set_value("3".to_owned());
    let err = binder.write_record().unwrap_err();
    assert!(matches!(err, WriteRecordError::Invalid(_)));
    assert_eq!(start.invalid_message().as_deref(), Some("bad start"));
}

// ---------------------------------------------------------------------------
// Property sets: named and dotted bindings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
struct Address {
    street: String,
    zip: String,
}

impl HasPropertySet for Address {
    fn define(properties: &mut PropertySetBuilder<Self>) {
        properties
            .property("street", |a| a.street.clone(), |a, v| a.street = v)
            .read_only("zip", |a| a.zip.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Customer {
    name: String,
    age: i32,
    address: Address,
}

impl HasPropertySet for Customer {
    fn define(properties: &mut PropertySetBuilder<Self>) {
        properties
            .property("name", |c| c.name.clone(), |c, v| c.name = v)
            .property("age", |c| c.age, |c, v| c.age = v)
            .nested(
                "address",
                |c| c.address.clone(),
                |c, v| c.address = v,
                Rc::new({
                    let mut b = PropertySetBuilder::new();
                    Address::define(&mut b);
                    b.build()
                }),
            );
    }
}

#[test]
fn bind_property_resolves_names_and_types() {
    let name = InputField::new(String::new());
    let binder = Binder::<Customer>::for_bean_type();
    binder
        .for_field(&name)
        .bind_property("name")
        .unwrap();

    name.set_value("Ada".to_owned());
    let mut customer = Customer::default();
    binder.write_bean(&mut customer).unwrap();
    assert_eq!(customer.name, "Ada");
}

#[test]
fn bind_property_rejects_type_mismatch() {
    let age = InputField::new(String::new());
    let binder = Binder::<Customer>::for_bean_type();
    // A String field bound straight to the i32 property, without a converter.
    let err = binder.for_field(&age).bind_property("age").unwrap_err();
    assert!(matches!(
        err,
        BinderError::Property(PropertyError::TypeMismatch { .. })
    ));
}

#[test]
fn dotted_path_reads_and_writes_the_nested_bean() {
    let street = InputField::new(String::new());
    let binder = Binder::<Customer>::for_bean_type();
    binder
        .for_field(&street)
        .bind_property("address.street")
        .unwrap();

    let mut customer = Customer {
        address: Address {
            street: "Main".to_owned(),
            zip: "111".to_owned(),
        },
        ..Customer::default()
    };
    binder.read_bean(&customer);
    assert_eq!(street.value(), "Main");

    street.set_value("Elm".to_owned());
    binder.write_bean(&mut customer).unwrap();
    assert_eq!(customer.address.street, "Elm");
    assert_eq!(customer.address.zip, "111");
}

#[test]
fn dotted_miss_reports_the_resolvable_prefix() {
    let field = InputField::new(String::new());
    let binder = Binder::<Customer>::for_bean_type();
    let err = binder
        .for_field(&field)
        .bind_property("address.country")
        .unwrap_err();
    let BinderError::Property(PropertyError::NotFound {
        resolved_prefix, ..
    }) = err
    else {
        panic!("expected NotFound");
    };
    assert_eq!(resolved_prefix.as_deref(), Some("address"));
}

#[test]
fn read_only_property_binding_never_writes() {
    let zip = InputField::new(String::new());
    let binder = Binder::<Customer>::for_bean_type();
    let binding = binder
        .for_field(&zip)
        .bind_property("address.zip")
        .unwrap();
    assert!(binding.is_read_only());

    zip.set_value("999".to_owned());
    let mut customer = Customer::default();
    binder.write_bean(&mut customer).unwrap();
    assert_eq!(customer.address.zip, "");
}

#[test]
fn instance_fields_bind_a_whole_form_at_once() {
    let name = InputField::new(String::new());
    let age = InputField::new(String::new());
    let binder = Binder::<Customer>::for_bean_type();
    let bound = binder
        .bind_instance_fields(vec![
            InstanceField::new("name", &name),
            InstanceField::new("age", &age),
        ])
        .unwrap();
    assert_eq!(bound, 2);

    name.set_value("Ada".to_owned());
    age.set_value("36".to_owned());
    let mut customer = Customer::default();
    binder.write_bean(&mut customer).unwrap();
    assert_eq!(customer.name, "Ada");
    assert_eq!(customer.age, 36);
    // The bridge converts back on commit, so the field keeps its text form.
    assert_eq!(age.value(), "36");
}

// ---------------------------------------------------------------------------
// Field default validators
// ---------------------------------------------------------------------------

#[test]
fn field_default_validator_runs_before_the_chain() {
    let code = InputField::new(String::new()).with_default_validator(Rc::new(from_fn(
        |v: &String, _: &ValueContext| {
            if v.chars().all(|c| c.is_ascii_digit()) {
                ValidationResult::ok()
            } else {
                ValidationResult::error("digits only")
            }
        },
    )));
    let binder = Binder::<Registration>::new();
    let binding = binder
        .for_field(&code)
        .bind(|r| r.username.clone(), |r, v| r.username = v);

    code.set_value("12a".to_owned());
    assert_eq!(binding.validate(false).message(), Some("digits only"));

    // Disabled binder-wide, the field's own check no longer blocks.
    binder.set_default_validators_enabled(false);
    assert!(!binding.validate(false).is_error());

    // A per-binding override wins over the binder-wide setting.
    binding.set_default_validator_enabled(Some(true));
    assert!(binding.validate(false).is_error());
}

// ---------------------------------------------------------------------------
// Status routing
// ---------------------------------------------------------------------------

#[test]
fn binder_status_handler_sees_everything_at_once() {
    let form = registration_form();
    let log: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let log_in = Rc::clone(&log);
    form.binder
        .set_validation_status_handler(Rc::new(move |status| {
            log_in.borrow_mut().push(status.field_errors().len());
        }));

    form.age.set_value("bad".to_owned());
    form.binder.validate();
    assert!(log.borrow().iter().any(|n| *n >= 2));
    // Default per-field display was replaced wholesale.
    assert_eq!(form.age.invalid_message(), None);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_integer_survives_a_bind_round_trip(n in any::<i32>()) {
            let age = InputField::new(String::new());
            let binder = Binder::<Registration>::new();
            binder
                .for_field(&age)
                .with_converter(StringToNumber::<i32>::new("bad"))
                .bind(|r| r.age, |r, v| r.age = v);

            age.set_value(n.to_string());
            let mut reg = Registration::default();
            binder.write_bean(&mut reg).unwrap();
            prop_assert_eq!(reg.age, n);
            prop_assert_eq!(age.value(), n.to_string());
        }

        #[test]
        fn failed_writes_never_leak_into_the_bean(a in any::<i32>(), b in any::<i32>()) {
            let age = InputField::new(String::new());
            let binder = Binder::<Registration>::new().with_validator(from_fn(
                |_: &Registration, _: &ValueContext| ValidationResult::error("no"),
            ));
            binder
                .for_field(&age)
                .with_converter(StringToNumber::<i32>::new("bad"))
                .bind(|r| r.age, |r, v| r.age = v);

            let mut reg = Registration { age: a, ..Registration::default() };
            age.set_value(b.to_string());
            prop_assert!(binder.write_bean(&mut reg).is_err());
            prop_assert_eq!(reg.age, a);
        }
    }
}

#[test]
fn single_binding_validate_reaches_the_binder_handler() {
    let form = registration_form();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in = Rc::clone(&seen);
    form.binder
        .set_validation_status_handler(Rc::new(move |status| {
            seen_in.borrow_mut().push(status.field_errors().len());
        }));

    let name = InputField::new(String::new()).with_label("Nickname");
    let binding = form
        .binder
        .for_field(&name)
        .with_validator(not_blank("nickname required"))
        .bind(|r: &Registration| r.username.clone(), |r, v| r.username = v);

    binding.validate(true);
    assert_eq!(*seen.borrow(), vec![1]);
    // The handler replaced the default display, so the field stays clean.
    assert_eq!(name.invalid_message(), None);

    binding.validate(false);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn binding_status_handler_overrides_one_field() {
    let form = registration_form();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in = Rc::clone(&seen);

    let name = InputField::new(String::new()).with_label("Nickname");
    let binding = form
        .binder
        .for_field(&name)
        .with_validator(not_blank("nickname required"))
        .bind(|r: &Registration| r.username.clone(), |r, v| r.username = v);
    binding.set_status_handler(Rc::new(move |status| {
        seen_in.borrow_mut().push(status.is_error());
    }));

    binding.validate(true);
    assert_eq!(*seen.borrow(), vec![true]);
    assert_eq!(name.invalid_message(), None);
}
