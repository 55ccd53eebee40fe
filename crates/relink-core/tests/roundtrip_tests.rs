use relink_core::{decode, encode};

/// Assert that a canonical payload decodes and re-encodes byte for byte.
fn assert_roundtrip(raw: &[u8]) {
    let value = decode(raw).unwrap_or_else(|e| {
        panic!(
            "decode failed: {e}\n  input: {}",
            String::from_utf8_lossy(raw)
        )
    });
    let encoded = encode(&value);
    assert_eq!(
        encoded,
        raw,
        "Roundtrip failed:\n  input:  {}\n  output: {}",
        String::from_utf8_lossy(raw),
        String::from_utf8_lossy(&encoded)
    );
    assert_eq!(decode(&encoded).unwrap(), value);
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn roundtrip_null() {
    assert_roundtrip(b"N;");
}

#[test]
fn roundtrip_bools() {
    assert_roundtrip(b"b:0;");
    assert_roundtrip(b"b:1;");
}

#[test]
fn roundtrip_integers() {
    assert_roundtrip(b"i:0;");
    assert_roundtrip(b"i:-12;");
    assert_roundtrip(b"i:1700000000;");
}

#[test]
fn roundtrip_floats() {
    for raw in [
        &b"d:0.1;"[..],
        b"d:2;",
        b"d:-0;",
        b"d:3.14159;",
        b"d:0.0001;",
        b"d:1.0E-5;",
        b"d:1.0E+25;",
        b"d:1.0E+15;",
        b"d:100000000000000;",
        b"d:0.30000000000000004;",
        b"d:NAN;",
        b"d:INF;",
        b"d:-INF;",
    ] {
        assert_roundtrip(raw);
    }
}

#[test]
fn roundtrip_strings() {
    assert_roundtrip(br#"s:0:"";"#);
    assert_roundtrip(br#"s:13:"https://a.com";"#);
    assert_roundtrip("s:5:\"café\";".as_bytes());
    assert_roundtrip(b"s:4:\"a\nb\x00\";");
}

// ============================================================================
// Realistic payloads
// ============================================================================

#[test]
fn roundtrip_widget_options() {
    assert_roundtrip(
        br#"a:2:{i:2;a:3:{s:5:"title";s:5:"Links";s:4:"text";s:32:"<a href="https://a.com">Home</a>";s:6:"filter";b:0;}s:12:"_multiwidget";i:1;}"#,
    );
}

#[test]
fn roundtrip_theme_mods() {
    assert_roundtrip(
        br#"a:3:{i:0;b:0;s:18:"nav_menu_locations";a:1:{s:7:"primary";i:3;}s:12:"header_image";s:34:"https://a.com/uploads/2024/hdr.jpg";}"#,
    );
}

#[test]
fn roundtrip_attachment_metadata() {
    assert_roundtrip(
        br#"a:4:{s:5:"width";i:1024;s:6:"height";i:768;s:4:"file";s:15:"2024/01/img.jpg";s:10:"image_meta";a:2:{s:8:"aperture";s:1:"0";s:12:"focal_length";d:4.2;}}"#,
    );
}

#[test]
fn roundtrip_object_payload() {
    assert_roundtrip(
        br#"O:8:"stdClass":3:{s:3:"url";s:13:"https://a.com";s:5:"count";i:3;s:4:"tags";a:1:{i:0;s:3:"seo";}}"#,
    );
}

#[test]
fn roundtrip_nested_objects() {
    assert_roundtrip(
        br#"a:1:{s:4:"post";O:7:"WP_Post":2:{s:2:"ID";i:9;s:6:"author";O:8:"stdClass":1:{s:4:"site";s:13:"https://a.com";}}}"#,
    );
}
