#![allow(non_snake_case)]

use super::*;
use crate::backend::GENERATED_HEADER;
use lcm_core::{Constant, FingerprintEngine, Member, Schema};

fn ty(name: &str) -> TypeName {
    TypeName::parse(name).unwrap()
}

fn scalar(name: &str, type_name: &str) -> Member {
    Member::new(name, ty(type_name), vec![])
}

fn schema() -> Schema {
    Schema::new(vec![
        StructDef::new(
            ty("geo.point_t"),
            vec![scalar("x", "double"), scalar("y", "double")],
        ),
        StructDef::new(
            ty("sensors.reading_t"),
            vec![
                scalar("count", "int32_t"),
                Member::new("values", ty("double"), vec![Dimension::variable("count")]),
                Member::new(
                    "grid",
                    ty("int16_t"),
                    vec![Dimension::variable("count"), Dimension::constant(3)],
                ),
                Member::new("corners", ty("geo.point_t"), vec![Dimension::constant(4)]),
                scalar("label", "string"),
                scalar("ok", "boolean"),
            ],
        )
        .with_constants(vec![
            Constant::new("MAX_COUNT", PrimitiveType::Int32, "64"),
            Constant::new("MASK", PrimitiveType::Byte, "0x7f"),
        ])
        .with_comment("Sensor sample"),
    ])
    .unwrap()
}

fn render_in(schema: &Schema, name: &str) -> Result<String, EmitError> {
    let fingerprints = FingerprintEngine::new(schema);
    let ctx = EmitContext {
        schema,
        fingerprints: &fingerprints,
    };
    let def = schema.get(&ty(name)).unwrap();
    JavaBackend::new(JavaOptions::default()).render_struct(def, &ctx)
}

fn render(name: &str) -> String {
    render_in(&schema(), name).unwrap()
}

#[test]
fn JavaBackend___artifact_path___follows_package() {
    let backend = JavaBackend::new(JavaOptions::default());
    let schema = schema();

    let path = backend.artifact_path(schema.get(&ty("sensors.reading_t")).unwrap());

    assert_eq!(path, Some(PathBuf::from("sensors").join("Reading.java")));
}

#[test]
fn JavaBackend___render_struct___declares_package_class_and_fields() {
    let code = render("sensors.reading_t");

    assert!(code.starts_with(GENERATED_HEADER));
    assert!(code.contains("package sensors;\n"));
    assert!(code.contains("import java.nio.charset.StandardCharsets;\n"));
    assert!(code.contains("/**\n * Sensor sample\n */\npublic final class Reading {\n"));
    assert!(code.contains("    public int count;\n"));
    assert!(code.contains("    public double[] values;\n"));
    assert!(code.contains("    public short[][] grid;\n"));
    assert!(code.contains("    public geo.Point[] corners;\n"));
    assert!(code.contains("    public String label;\n"));
    assert!(code.contains("    public boolean ok;\n"));
}

#[test]
fn JavaBackend___render_struct___fingerprint_and_constants() {
    let schema = schema();
    let expected = FingerprintEngine::new(&schema)
        .fingerprint(&ty("sensors.reading_t"))
        .unwrap();

    let code = render("sensors.reading_t");

    assert!(code.contains(&format!("public static final long FINGERPRINT = {expected:#018x}L;")));
    assert!(code.contains("public static final int MAX_COUNT = 64;"));
    assert!(code.contains("public static final byte MASK = (byte) 0x7f;"));
}

#[test]
fn JavaBackend___render_struct___constructor_allocates_arrays() {
    let code = render("sensors.reading_t");

    assert!(code.contains("        this.values = new double[0];\n"));
    assert!(code.contains("        this.grid = new short[0][3];\n"));
    assert!(code.contains(
        "        this.corners = new geo.Point[4];\n        for (int a = 0; a < 4; a++) {\n            this.corners[a] = new geo.Point();\n        }\n"
    ));
    assert!(code.contains("        this.label = \"\";\n"));
}

#[test]
fn JavaBackend___render_struct___encode_checks_declared_count() {
    let code = render("sensors.reading_t");

    assert!(code.contains("        __out.writeLong(FINGERPRINT);\n        _encodeRecursive(__out);\n"));
    assert!(code.contains("        __out.writeInt(this.count);\n"));
    assert!(code.contains("        if (this.count < 0 || this.count > this.values.length) throw new IOException("));
    assert!(code.contains(
        "        for (int a = 0; a < this.count; a++) {\n            __out.writeDouble(this.values[a]);\n        }\n"
    ));
    assert!(code.contains(
        "            for (int b = 0; b < 3; b++) {\n                __out.writeShort(this.grid[a][b]);\n            }\n"
    ));
    assert!(code.contains("            this.corners[a]._encodeRecursive(__out);\n"));
    assert!(code.contains("        _encodeString(__out, this.label);\n"));
    assert!(code.contains("        __out.writeByte(this.ok ? 1 : 0);\n"));
}

#[test]
fn JavaBackend___render_struct___decode_grows_variable_arrays_from_bounded_allocation() {
    let code = render("sensors.reading_t");

    assert!(code.contains("        this.count = __in.readInt();\n"));
    assert!(code.contains(
        "        if (this.count < 0 || this.count > Integer.MAX_VALUE) throw new IOException(\"invalid element count \" + this.count + \" for 'values'\");\n"
    ));
    assert!(code.contains(
        "        this.values = new double[(int) Math.min(this.count, 4096)];\n        for (int a = 0; a < this.count; a++) {\n            if (a == this.values.length) this.values = java.util.Arrays.copyOf(this.values, (int) Math.min(2L * this.values.length, this.count));\n            this.values[a] = __in.readDouble();\n        }\n"
    ));
    assert!(!code.contains("new double[(int) this.count]"));
}

#[test]
fn JavaBackend___render_struct___decode_allocates_each_axis_in_its_loop() {
    let code = render("sensors.reading_t");

    assert!(code.contains("        this.grid = new short[(int) Math.min(this.count, 4096)][];\n"));
    assert!(code.contains(
        "            this.grid[a] = new short[3];\n            for (int b = 0; b < 3; b++) {\n                this.grid[a][b] = __in.readShort();\n"
    ));
    assert!(code.contains(
        "        this.corners = new geo.Point[4];\n        for (int a = 0; a < 4; a++) {\n            this.corners[a] = geo.Point._decodeRecursiveFactory(__in);\n"
    ));
    assert!(code.contains("if (fingerprint != FINGERPRINT) {"));
}

#[test]
fn JavaBackend___render_struct___decode_rejects_invalid_booleans_and_utf8() {
    let code = render("sensors.reading_t");

    assert!(code.contains("        this.ok = _decodeBoolean(__in);\n"));
    assert!(code.contains("if (value != 0 && value != 1) {"));
    assert!(code.contains(".onMalformedInput(java.nio.charset.CodingErrorAction.REPORT)"));
    assert!(!code.contains("new String(bytes, StandardCharsets.UTF_8)"));
    assert!(!code.contains("new byte[length - 1]"));
}

#[test]
fn JavaBackend___int64_count___is_range_checked_before_use() {
    let schema = Schema::new(vec![StructDef::new(
        ty("samples_t"),
        vec![
            scalar("n", "int64_t"),
            Member::new("data", ty("int32_t"), vec![Dimension::variable("n")]),
        ],
    )])
    .unwrap();

    let code = render_in(&schema, "samples_t").unwrap();

    let check = code.find("if (this.n < 0 || this.n > Integer.MAX_VALUE) throw").unwrap();
    let allocate = code.find("this.data = new int[(int) Math.min(this.n, 4096)];").unwrap();
    assert!(check < allocate);
    assert!(!code.contains("_decodeBoolean"));
}

#[test]
fn JavaBackend___render_struct___size_multiplies_fixed_width_leaves() {
    let code = render("sensors.reading_t");

    assert!(code.contains("        __size += 4;\n"));
    assert!(code.contains("        __size += 8 * this.count;\n"));
    assert!(code.contains("        __size += 2 * this.count * 3;\n"));
    assert!(code.contains("            __size += this.corners[a].getEncodedSize();\n"));
    assert!(code.contains("        __size += 4 + this.label.getBytes(StandardCharsets.UTF_8).length + 1;\n"));
}

#[test]
fn JavaBackend___no_strings___omits_string_helpers() {
    let code = render("geo.point_t");

    assert!(!code.contains("StandardCharsets"));
    assert!(!code.contains("_encodeString"));
}

#[test]
fn JavaBackend___unsigned_member___is_unsupported() {
    let schema = Schema::new(vec![StructDef::new(
        ty("counter_t"),
        vec![scalar("value", "uint32_t")],
    )])
    .unwrap();

    let result = render_in(&schema, "counter_t");

    assert!(matches!(result, Err(EmitError::Unsupported { backend: "java", .. })));
}

#[test]
fn JavaBackend___keyword_member___is_unsupported() {
    let schema = Schema::new(vec![StructDef::new(
        ty("holder_t"),
        vec![scalar("class", "int32_t")],
    )])
    .unwrap();

    let result = render_in(&schema, "holder_t");

    assert!(matches!(result, Err(EmitError::Unsupported { ref item, .. }) if item == "holder_t.class"));
}

#[test]
fn JavaBackend___index_files___are_empty() {
    let schema = schema();
    let fingerprints = FingerprintEngine::new(&schema);
    let ctx = EmitContext {
        schema: &schema,
        fingerprints: &fingerprints,
    };

    let files = JavaBackend::new(JavaOptions::default()).index_files(&ctx).unwrap();

    assert!(files.is_empty());
}
