//! JSON codec tests: round-trips, the `_field` shadow channel, choice keys
//! and the resource container.

use arbor_fhir::{DataType, FieldValue, Node, PrimitiveValue, ResourceType, TypeAdapter};
use arbor_serde::json::{
    element_from_json_value, from_json_str_with, from_json_value_with, to_json_value,
};
use arbor_serde::{
    DecodeOptions, Result, SerdeError, from_json_str, from_json_value, to_json_string,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};

const PATIENT: &str = r##"{
  "resourceType": "Patient",
  "id": "example",
  "meta": {
    "lastUpdated": "2024-01-15T10:30:00Z"
  },
  "text": {
    "status": "generated",
    "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\"><p>Peter <b>Chalmers</b></p></div>"
  },
  "extension": [
    {
      "url": "http://example.org/fhir/StructureDefinition/eye-colour",
      "valueCode": "blue"
    }
  ],
  "identifier": [
    {
      "use": "usual",
      "system": "urn:oid:1.2.36.146.595.217.0.1",
      "value": "12345"
    }
  ],
  "active": true,
  "name": [
    {
      "id": "n1",
      "use": "official",
      "family": "Chalmers",
      "given": ["Peter", "James"]
    }
  ],
  "gender": "male",
  "birthDate": "1974-12-25",
  "_birthDate": {
    "extension": [
      {
        "url": "http://hl7.org/fhir/StructureDefinition/patient-birthTime",
        "valueDateTime": "1974-12-25T14:35:45-05:00"
      }
    ]
  },
  "deceasedBoolean": false,
  "contact": [
    {
      "relationship": [
        {
          "coding": [
            {
              "system": "http://terminology.hl7.org/CodeSystem/v2-0131",
              "code": "N"
            }
          ]
        }
      ],
      "name": {
        "family": "du Marché",
        "_family": {
          "extension": [
            {
              "url": "http://hl7.org/fhir/StructureDefinition/humanname-own-prefix",
              "valueString": "VV"
            }
          ]
        },
        "given": ["Bénédicte"]
      },
      "gender": "female"
    }
  ],
  "managingOrganization": {
    "reference": "Organization/1"
  }
}"##;

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

// =============================================================================
// Round-trips
// =============================================================================

#[test]
fn test_patient_round_trip() -> Result<()> {
    let patient = from_json_str(PATIENT)?;
    assert_eq!(patient.resource_type(), ResourceType::Patient);
    assert_eq!(patient.resource_id(), Some("example"));
    assert_eq!(to_json_value(&patient)?, parse(PATIENT));
    Ok(())
}

#[test]
fn test_round_trip_is_stable() -> Result<()> {
    let first = to_json_string(&from_json_str(PATIENT)?)?;
    let second = to_json_string(&from_json_str(&first)?)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_metadata_only_primitive_round_trips() -> Result<()> {
    let input = json!({
        "resourceType": "Patient",
        "_birthDate": {
            "id": "bd1",
            "extension": [{
                "url": "http://hl7.org/fhir/StructureDefinition/data-absent-reason",
                "valueCode": "unknown"
            }]
        }
    });
    let patient = from_json_value(&input)?;
    let birth_date = patient.content().get("birthDate").unwrap().nodes()[0]
        .as_primitive()
        .unwrap();
    assert_eq!(birth_date.value(), None);
    assert_eq!(birth_date.id(), Some("bd1"));
    assert_eq!(birth_date.extensions().len(), 1);
    assert_eq!(to_json_value(&patient)?, input);
    Ok(())
}

#[test]
fn test_sparse_repeated_metadata_round_trips() -> Result<()> {
    let input = json!({
        "resourceType": "Patient",
        "name": [{
            "given": ["Alpha", null, "Gamma"],
            "_given": [null, {"id": "g2"}, null]
        }]
    });
    let patient = from_json_value(&input)?;
    let name = patient.content().get("name").unwrap().nodes()[0]
        .as_complex()
        .unwrap();
    let given = name.get("given").unwrap().nodes();
    assert_eq!(given.len(), 3);
    assert_eq!(given[1].as_primitive().unwrap().value(), None);
    assert_eq!(given[1].as_primitive().unwrap().id(), Some("g2"));
    assert_eq!(to_json_value(&patient)?, input);
    Ok(())
}

#[test]
fn test_decimal_precision_is_preserved() -> Result<()> {
    let input = concat!(
        r#"{"resourceType":"Observation","status":"final","code":{"text":"weight"},"#,
        r#""valueQuantity":{"value":85.50,"unit":"kg"}}"#
    );
    let observation = from_json_str(input)?;
    let quantity = observation.content().get("value").and_then(FieldValue::as_choice).unwrap();
    let value = quantity.value().as_complex().unwrap().get("value").unwrap().nodes()[0]
        .as_primitive()
        .unwrap()
        .value()
        .cloned();
    assert_eq!(value, Some(PrimitiveValue::Decimal(dec!(85.50))));
    assert_eq!(to_json_string(&observation)?, input);
    Ok(())
}

#[test]
fn test_pretty_output_decodes_to_the_same_tree() -> Result<()> {
    let patient = from_json_str(PATIENT)?;
    let pretty = arbor_serde::to_json_string_pretty(&patient)?;
    assert!(pretty.contains("\n  \"id\": \"example\""));
    assert_eq!(from_json_str(&pretty)?, patient);
    Ok(())
}

// =============================================================================
// Shadow channel
// =============================================================================

#[test]
fn test_trailing_shadow_entries_are_metadata_only_elements() -> Result<()> {
    let input = json!({
        "resourceType": "Patient",
        "name": [{
            "given": ["Peter"],
            "_given": [null, {"id": "trailing"}]
        }]
    });
    let patient = from_json_value(&input)?;
    let name = patient.content().get("name").unwrap().nodes()[0]
        .as_complex()
        .unwrap();
    let given = name.get("given").unwrap().nodes();
    assert_eq!(given.len(), 2);
    assert_eq!(given[1].as_primitive().unwrap().id(), Some("trailing"));

    // Re-encoding pads the value array so the channels line up.
    assert_eq!(
        to_json_value(&patient)?["name"][0]["given"],
        json!(["Peter", null])
    );
    Ok(())
}

#[test]
fn test_shorter_shadow_is_malformed() {
    let input = json!({
        "resourceType": "Patient",
        "name": [{"given": ["A", "B"], "_given": [{"id": "a"}]}]
    });
    let err = from_json_value(&input).unwrap_err();
    match &err {
        SerdeError::MalformedShadow { field, .. } => assert_eq!(field, "Patient.name[0].given"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_shadow_of_wrong_kind_is_malformed() {
    let scalar = json!({"resourceType": "Patient", "active": true, "_active": [{"id": "a"}]});
    assert!(matches!(
        from_json_value(&scalar),
        Err(SerdeError::MalformedShadow { .. })
    ));

    let repeated = json!({
        "resourceType": "Patient",
        "name": [{"given": ["A"], "_given": {"id": "a"}}]
    });
    assert!(matches!(
        from_json_value(&repeated),
        Err(SerdeError::MalformedShadow { .. })
    ));
}

#[test]
fn test_element_with_neither_value_nor_metadata_is_malformed() {
    let input = json!({
        "resourceType": "Patient",
        "name": [{"given": ["A", null], "_given": [null, null]}]
    });
    assert!(matches!(
        from_json_value(&input),
        Err(SerdeError::MalformedShadow { .. })
    ));

    let empty_object = json!({"resourceType": "Patient", "_active": {}});
    assert!(matches!(
        from_json_value(&empty_object),
        Err(SerdeError::MalformedShadow { .. })
    ));
}

#[test]
fn test_unknown_metadata_keys_are_rejected() {
    let input = json!({"resourceType": "Patient", "active": true, "_active": {"note": "x"}});
    assert!(matches!(
        from_json_value(&input),
        Err(SerdeError::MalformedShadow { .. })
    ));
}

#[test]
fn test_extensions_need_a_url() {
    for input in [
        json!({"resourceType": "Patient", "extension": [{"valueBoolean": true}]}),
        json!({
            "resourceType": "Patient",
            "active": true,
            "_active": {"extension": [{"valueString": "x"}]}
        }),
        json!({
            "resourceType": "Patient",
            "extension": [{
                "url": "http://example.org/outer",
                "extension": [{"valueCode": "inner"}]
            }]
        }),
    ] {
        let err = from_json_value(&input).unwrap_err();
        assert!(matches!(err, SerdeError::Decode { .. }), "{input}: {err}");
        assert!(err.to_string().contains("url"));
    }
}

// =============================================================================
// Value kinds and unknown keys
// =============================================================================

#[test]
fn test_unknown_keys_are_errors() {
    let input = json!({"resourceType": "Patient", "nickname": "Pete"});
    let err = from_json_value(&input).unwrap_err();
    assert!(matches!(err, SerdeError::Decode { .. }));
    assert!(err.to_string().contains("nickname"));
}

#[test]
fn test_value_kinds_are_not_coerced() {
    for input in [
        json!({"resourceType": "Patient", "active": "true"}),
        json!({"resourceType": "Patient", "gender": 1}),
        json!({"resourceType": "Bundle", "type": "searchset", "total": 1.5}),
        json!({"resourceType": "Bundle", "type": "searchset", "total": -1}),
        json!({"resourceType": "Patient", "multipleBirthInteger": 3000000000i64}),
        json!({"resourceType": "Patient", "name": {"family": "x"}}),
        json!({"resourceType": "Patient", "managingOrganization": "Organization/1"}),
    ] {
        assert!(
            matches!(from_json_value(&input), Err(SerdeError::Decode { .. })),
            "accepted {input}"
        );
    }
}

#[test]
fn test_narrative_div_must_be_xhtml() {
    for div in [
        "hello",
        "<div>no namespace</div>",
        r#"<p xmlns="http://www.w3.org/1999/xhtml">a paragraph</p>"#,
        r#"<div xmlns="http://www.w3.org/1999/xhtml">one</div><div>two</div>"#,
    ] {
        let input = json!({
            "resourceType": "Patient",
            "text": {"status": "generated", "div": div}
        });
        assert!(
            matches!(from_json_value(&input), Err(SerdeError::Decode { .. })),
            "accepted div {div:?}"
        );
    }
}

#[test]
fn test_element_decoding_against_a_shape() -> Result<()> {
    let coding = element_from_json_value(
        &json!({"system": "http://loinc.org", "code": "8867-4", "userSelected": true}),
        &arbor_fhir::catalog::datatypes::CODING,
    )?;
    assert_eq!(coding.type_name(), "Coding");
    assert_eq!(
        coding.children(Some(&["code"][..]))[0].to_system_string(false),
        Ok(Some("8867-4".to_string()))
    );
    Ok(())
}

// =============================================================================
// Choice fields
// =============================================================================

#[test]
fn test_choice_key_selects_the_alternative() -> Result<()> {
    let patient = from_json_value(&json!({
        "resourceType": "Patient",
        "deceasedDateTime": "2015-02-14T13:42:00+10:00"
    }))?;
    let choice = patient.content().get("deceased").and_then(FieldValue::as_choice).unwrap();
    assert_eq!(choice.data_type(), DataType::DateTime);
    Ok(())
}

#[test]
fn test_two_alternatives_are_ambiguous() {
    let input = json!({
        "resourceType": "Patient",
        "deceasedBoolean": true,
        "deceasedDateTime": "2015-02-14"
    });
    assert!(matches!(
        from_json_value(&input),
        Err(SerdeError::AmbiguousChoice { field }) if field == "deceased[x]"
    ));
}

#[test]
fn test_shadow_of_another_alternative_is_ambiguous() {
    let input = json!({
        "resourceType": "Patient",
        "deceasedBoolean": true,
        "_deceasedDateTime": {"id": "d"}
    });
    assert!(matches!(
        from_json_value(&input),
        Err(SerdeError::AmbiguousChoice { .. })
    ));
}

#[test]
fn test_undeclared_alternative_is_unknown_field() {
    let input = json!({"resourceType": "Patient", "deceasedString": "yes"});
    assert!(matches!(
        from_json_value(&input),
        Err(SerdeError::Decode { .. })
    ));
}

#[test]
fn test_choice_primitive_with_shadow() -> Result<()> {
    let input = json!({
        "resourceType": "Patient",
        "multipleBirthInteger": 2,
        "_multipleBirthInteger": {"id": "mb"}
    });
    let patient = from_json_value(&input)?;
    let choice = patient
        .content()
        .get("multipleBirth")
        .and_then(FieldValue::as_choice)
        .unwrap();
    assert_eq!(choice.value().as_primitive().unwrap().id(), Some("mb"));
    assert_eq!(to_json_value(&patient)?, input);
    Ok(())
}

#[test]
fn test_null_alternative_is_absent() -> Result<()> {
    let input = json!({
        "resourceType": "Observation",
        "status": "final",
        "valueBoolean": true,
        "valueString": null
    });
    let observation = from_json_value(&input)?;
    let choice = observation.content().get("value").and_then(FieldValue::as_choice).unwrap();
    assert_eq!(choice.data_type(), DataType::Boolean);

    let reversed = json!({
        "resourceType": "Observation",
        "status": "final",
        "valueString": null,
        "valueBoolean": true
    });
    assert_eq!(from_json_value(&reversed)?, observation);

    // With a shadow the null alternative is present, so the pair conflicts.
    let shadowed = json!({
        "resourceType": "Observation",
        "status": "final",
        "valueBoolean": true,
        "valueString": null,
        "_valueString": {"id": "v"}
    });
    assert!(matches!(
        from_json_value(&shadowed),
        Err(SerdeError::AmbiguousChoice { .. })
    ));
    Ok(())
}

// =============================================================================
// Resource container
// =============================================================================

#[test]
fn test_contained_resources_are_resolved_by_discriminator() -> Result<()> {
    let input = json!({
        "resourceType": "Observation",
        "contained": [
            {"resourceType": "Patient", "id": "p1"},
            {"resourceType": "Practitioner", "id": "pr1", "active": true}
        ],
        "status": "final",
        "code": {"text": "weight"},
        "subject": {"reference": "#p1"}
    });
    let observation = from_json_value(&input)?;
    let contained = observation.content().get("contained").unwrap().nodes();
    let types: Vec<_> = contained
        .iter()
        .filter_map(Node::as_resource)
        .map(|r| r.resource_type())
        .collect();
    assert_eq!(types, vec![ResourceType::Patient, ResourceType::Practitioner]);
    assert_eq!(to_json_value(&observation)?, input);
    Ok(())
}

#[test]
fn test_bundle_entries_hold_any_resource() -> Result<()> {
    let input = json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": 2,
        "entry": [
            {
                "fullUrl": "http://example.org/fhir/Patient/1",
                "resource": {"resourceType": "Patient", "id": "1"},
                "search": {"mode": "match", "score": 1.0}
            },
            {
                "fullUrl": "http://example.org/fhir/Organization/2",
                "resource": {"resourceType": "Organization", "id": "2", "name": "ACME"},
                "search": {"mode": "include"}
            }
        ]
    });
    let bundle = from_json_value(&input)?;
    assert_eq!(bundle.resource_type(), ResourceType::Bundle);
    assert_eq!(to_json_value(&bundle)?, input);
    Ok(())
}

#[test]
fn test_unknown_resource_type() {
    let err = from_json_str(r#"{"resourceType": "Medication", "id": "m"}"#).unwrap_err();
    assert!(matches!(&err, SerdeError::UnknownResourceType(tag) if tag == "Medication"));

    let nested = json!({
        "resourceType": "Patient",
        "contained": [{"resourceType": "Spaceship"}]
    });
    assert!(matches!(
        from_json_value(&nested),
        Err(SerdeError::UnknownResourceType(tag)) if tag == "Spaceship"
    ));
}

#[test]
fn test_missing_or_non_string_resource_type() {
    assert!(matches!(
        from_json_str(r#"{"id": "x"}"#),
        Err(SerdeError::Decode { .. })
    ));
    assert!(matches!(
        from_json_str(r#"{"resourceType": 7}"#),
        Err(SerdeError::Decode { .. })
    ));
    assert!(matches!(
        from_json_str(r#"["Patient"]"#),
        Err(SerdeError::Decode { .. })
    ));
}

#[test]
fn test_syntax_errors_are_json_errors() {
    assert!(matches!(
        from_json_str(r#"{"resourceType": "Patient""#),
        Err(SerdeError::Json(_))
    ));
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn test_depth_limit() {
    let input = json!({
        "resourceType": "Patient",
        "contained": [{
            "resourceType": "Patient",
            "contained": [{"resourceType": "Patient", "id": "deep"}]
        }]
    });
    let options = DecodeOptions::default().max_depth(2);
    assert!(matches!(
        from_json_value_with(&input, &options),
        Err(SerdeError::DepthLimitExceeded { limit: 2 })
    ));
    assert!(from_json_value_with(&input, &DecodeOptions::default().max_depth(3)).is_ok());
}

#[test]
fn test_nested_extensions_count_towards_depth() {
    let input = json!({
        "resourceType": "Patient",
        "_active": {
            "extension": [{
                "url": "http://example.org/outer",
                "extension": [{"url": "http://example.org/inner", "valueBoolean": true}]
            }]
        }
    });
    let options = DecodeOptions::default().max_depth(2);
    assert!(matches!(
        from_json_value_with(&input, &options),
        Err(SerdeError::DepthLimitExceeded { .. })
    ));
}

#[test]
fn test_input_size_limit() {
    let options = DecodeOptions::default().max_input_bytes(16);
    let err = from_json_str_with(r#"{"resourceType": "Patient"}"#, &options).unwrap_err();
    assert!(matches!(err, SerdeError::InputTooLarge { limit: 16, .. }));
}
