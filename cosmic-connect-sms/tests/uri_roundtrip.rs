//! Property tests for `sms:` URI parsing
//!
//! Any request that can be built from valid addresses serializes to a URI
//! that parses back to an equal request.

use cosmic_connect_sms::{parse_uri, NumberAddress, SmsError, SmsRequest};
use proptest::prelude::*;

fn arb_number() -> impl Strategy<Value = String> {
    proptest::string::string_regex(r"\+?[0-9A-Fa-f*#().\-]{1,6}( [0-9A-Fa-f*#().\-]{1,6}){0,2}")
        .expect("valid regex")
}

fn arb_address() -> impl Strategy<Value = NumberAddress> {
    let context = proptest::option::of(
        proptest::string::string_regex(r"\+[0-9]{1,3}").expect("valid regex"),
    );
    (arb_number(), context).prop_map(|(number, context)| {
        let token = match context {
            Some(prefix) => format!("{};phone-context={}", number, prefix),
            None => number,
        };
        NumberAddress::parse(&token).expect("generated token matches the grammar")
    })
}

fn arb_request() -> impl Strategy<Value = SmsRequest> {
    let recipients = proptest::collection::vec(arb_address(), 1..4);
    let body = proptest::option::of(any::<String>());
    (recipients, body).prop_map(|(recipients, body)| {
        SmsRequest::new(recipients, body).expect("at least one recipient")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn serialized_request_parses_back(request in arb_request()) {
        let uri = request.to_string();
        let parsed = parse_uri(&uri);
        prop_assert!(parsed.is_ok(), "{} failed: {:?}", uri, parsed);
        prop_assert_eq!(parsed.unwrap(), request);
    }

    #[test]
    fn any_fragment_is_rejected(request in arb_request(), fragment in "[a-z0-9]{0,8}") {
        let uri = format!("{}#{}", request, fragment);
        prop_assert!(matches!(parse_uri(&uri), Err(SmsError::MalformedUri(_))));
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,64}") {
        let _ = parse_uri(&format!("sms:{}", input));
        let _ = NumberAddress::parse(&input);
    }
}

#[test]
fn test_phone_context_prefix_applied() {
    let request = parse_uri("sms:5551234;phone-context=+1").unwrap();
    assert_eq!(request.recipients()[0].as_str(), "+15551234");
    assert_eq!(request.to_string(), "sms:+15551234");
}

#[test]
fn test_error_kinds() {
    assert!(matches!(parse_uri("sms:"), Err(SmsError::MalformedUri(_))));
    assert!(matches!(parse_uri("sms:5551234,"), Err(SmsError::MalformedUri(_))));
    assert!(matches!(parse_uri("sms:5551234#x"), Err(SmsError::MalformedUri(_))));
    assert!(matches!(
        parse_uri("sms:5551234?body=a&body=b"),
        Err(SmsError::DuplicateField(field)) if field == "body"
    ));
}
