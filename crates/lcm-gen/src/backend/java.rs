//! Java class generation.
//!
//! One `public final class` per struct, in the Java package named after the
//! schema package. Classes use `java.io.DataOutput`/`DataInput`, which are
//! big-endian like the wire format, and need no runtime library.

use super::jvm_types::{JvmType, is_java_keyword, map_primitive};
use super::{Backend, EmitContext, GENERATOR_VERSION, IndexFile, header, push_comment};
use crate::config::JavaOptions;
use crate::error::EmitError;
use lcm_core::marshal::{Axis, Leaf, MarshalPlan, MarshalRenderer, MemberPlan, Phase, synthesize};
use lcm_core::naming::{package_to_path, type_name};
use lcm_core::{Dimension, PrimitiveType, StructDef, TypeName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BACKEND: &str = "java";

/// Largest number of elements allocated up front for a count read off the wire
const PREALLOCATION_CAP: usize = 4096;

pub struct JavaBackend {
    options: JavaOptions,
}

impl JavaBackend {
    pub fn new(options: JavaOptions) -> Self {
        Self { options }
    }

    fn class_name(ty: &TypeName) -> Result<String, EmitError> {
        let name = type_name(ty.short_name());
        if name.is_empty() {
            return Err(unsupported(ty.full_name(), "the name has no letters to form a class name"));
        }
        Ok(name)
    }

    /// Class name, qualified unless it lives in the default package
    fn class_path(ty: &TypeName) -> Result<String, EmitError> {
        let class = Self::class_name(ty)?;
        if ty.package().is_empty() {
            Ok(class)
        } else {
            Ok(format!("{}.{class}", ty.package()))
        }
    }

    fn jvm_type(def: &StructDef, name: &str, primitive: PrimitiveType) -> Result<JvmType, EmitError> {
        map_primitive(primitive).ok_or_else(|| {
            unsupported(
                format!("{}.{name}", def.name().full_name()),
                format!("{primitive} has no Java equivalent"),
            )
        })
    }

    /// Resolve every member's leaf type, rejecting what Java cannot express
    fn leaves(&self, plan: &MarshalPlan<'_>) -> Result<HashMap<String, JavaLeaf>, EmitError> {
        let def = plan.struct_def();
        let mut leaves = HashMap::new();
        for member in plan.members() {
            if is_java_keyword(member.name()) {
                return Err(unsupported(
                    format!("{}.{}", def.name().full_name(), member.name()),
                    "the member name is a Java keyword",
                ));
            }
            let leaf = match member.leaf() {
                Leaf::Primitive(primitive) => {
                    JavaLeaf::Primitive(Self::jvm_type(def, member.name(), primitive)?)
                }
                Leaf::Struct(ty) => JavaLeaf::Struct(Self::class_path(ty)?),
            };
            leaves.insert(member.name().to_string(), leaf);
        }
        Ok(leaves)
    }
}

fn unsupported(item: String, reason: impl Into<String>) -> EmitError {
    EmitError::Unsupported {
        backend: BACKEND,
        item,
        reason: reason.into(),
    }
}

/// Java element type of a member
#[derive(Debug, Clone)]
enum JavaLeaf {
    Primitive(JvmType),
    /// Qualified class name
    Struct(String),
}

impl JavaLeaf {
    fn name(&self) -> &str {
        match self {
            JavaLeaf::Primitive(jvm) => jvm.name,
            JavaLeaf::Struct(class) => class,
        }
    }

    fn is(&self, primitive: PrimitiveType) -> bool {
        matches!(self, JavaLeaf::Primitive(jvm) if jvm.primitive == primitive)
    }

    /// Initial value for a scalar field, if Java's default is not right
    fn initial(&self) -> Option<String> {
        match self {
            JavaLeaf::Primitive(jvm) if jvm.primitive == PrimitiveType::String => {
                Some(jvm.zero().to_string())
            }
            JavaLeaf::Primitive(_) => None,
            JavaLeaf::Struct(class) => Some(format!("new {class}()")),
        }
    }
}

/// `[0][3]` style allocation suffix of a freshly constructed, empty field
fn empty_allocation(dimensions: &[Dimension]) -> String {
    dimensions
        .iter()
        .map(|dim| match dim {
            Dimension::Constant { size } => format!("[{size}]"),
            Dimension::Variable { .. } => "[0]".to_string(),
        })
        .collect()
}

fn index_var(depth: usize) -> char {
    char::from(b'a' + (depth % 26) as u8)
}

impl Backend for JavaBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn output_directory(&self) -> &Path {
        &self.options.output
    }

    fn artifact_path(&self, def: &StructDef) -> Option<PathBuf> {
        let class = type_name(def.name().short_name());
        Some(package_to_path(def.name().package()).join(format!("{class}.java")))
    }

    fn render_struct(&self, def: &StructDef, ctx: &EmitContext<'_>) -> Result<String, EmitError> {
        let plan = MarshalPlan::new(def, ctx.schema)?;
        let leaves = self.leaves(&plan)?;
        let class = Self::class_name(def.name())?;
        let fingerprint = ctx.fingerprint(def)?;
        let has_strings = leaves.values().any(|leaf| leaf.is(PrimitiveType::String));
        let has_booleans = leaves.values().any(|leaf| leaf.is(PrimitiveType::Boolean));

        let mut code = header(&self.stamp(), def.source());
        code.push('\n');

        // Package and imports
        if !def.name().package().is_empty() {
            code.push_str(&format!("package {};\n\n", def.name().package()));
        }
        code.push_str("import java.io.DataInput;\n");
        code.push_str("import java.io.DataOutput;\n");
        code.push_str("import java.io.IOException;\n");
        if has_strings {
            code.push_str("import java.nio.charset.StandardCharsets;\n");
        }
        code.push('\n');

        // Class documentation
        if def.comment().is_some() {
            code.push_str("/**\n");
            push_comment(&mut code, "", " * ", def.comment());
            code.push_str(" */\n");
        }
        code.push_str(&format!("public final class {class} {{\n"));
        code.push_str(&format!(
            "    public static final long FINGERPRINT = {fingerprint:#018x}L;\n"
        ));

        // Constants
        for constant in def.constants() {
            if is_java_keyword(constant.name()) {
                return Err(unsupported(
                    format!("{}.{}", def.name().full_name(), constant.name()),
                    "the constant name is a Java keyword",
                ));
            }
            let jvm = Self::jvm_type(def, constant.name(), constant.ty())?;
            code.push('\n');
            push_comment(&mut code, "    ", "// ", constant.comment());
            code.push_str(&format!(
                "    public static final {} {} = {};\n",
                jvm.name,
                constant.name(),
                jvm.literal(constant.value().trim())
            ));
        }

        // Fields
        for member in def.members() {
            let leaf = &leaves[member.name()];
            code.push('\n');
            if member.comment().is_some() {
                code.push_str("    /**\n");
                push_comment(&mut code, "    ", " * ", member.comment());
                code.push_str("     */\n");
            }
            code.push_str(&format!(
                "    public {}{} {};\n",
                leaf.name(),
                "[]".repeat(member.dimensions().len()),
                member.name()
            ));
        }

        // Constructor
        code.push_str(&format!("\n    public {class}() {{\n"));
        for member in def.members() {
            let leaf = &leaves[member.name()];
            let field = member.name();
            let dims = member.dimensions();
            if dims.is_empty() {
                if let Some(initial) = leaf.initial() {
                    code.push_str(&format!("        this.{field} = {initial};\n"));
                }
                continue;
            }
            code.push_str(&format!(
                "        this.{field} = new {}{};\n",
                leaf.name(),
                empty_allocation(dims)
            ));
            let all_constant = dims.iter().all(|dim| !dim.is_variable());
            if all_constant && let Some(initial) = leaf.initial() {
                let mut target = format!("this.{field}");
                let mut indent = 2;
                for (depth, dim) in dims.iter().enumerate() {
                    let var = index_var(depth);
                    code.push_str(&format!(
                        "{}for (int {var} = 0; {var} < {}; {var}++) {{\n",
                        "    ".repeat(indent),
                        dim.size_text()
                    ));
                    target = format!("{target}[{var}]");
                    indent += 1;
                }
                code.push_str(&format!("{}{target} = {initial};\n", "    ".repeat(indent)));
                for _ in dims {
                    indent -= 1;
                    code.push_str(&format!("{}}}\n", "    ".repeat(indent)));
                }
            }
        }
        code.push_str("    }\n");

        let mut renderer = JavaMarshal {
            leaves: &leaves,
            lines: Vec::new(),
            indent: 0,
            access: Vec::new(),
            factors: Vec::new(),
            counting: false,
        };

        // Encode
        code.push_str("\n    public void encode(DataOutput __out) throws IOException {\n");
        code.push_str("        __out.writeLong(FINGERPRINT);\n");
        code.push_str("        _encodeRecursive(__out);\n");
        code.push_str("    }\n");

        code.push_str("\n    public void _encodeRecursive(DataOutput __out) throws IOException {\n");
        synthesize(&plan, Phase::Encode, &mut renderer);
        renderer.drain_into(&mut code);
        code.push_str("    }\n");

        // Decode
        code.push_str(&format!(
            "\n    public static {class} decode(DataInput __in) throws IOException {{\n"
        ));
        code.push_str("        long fingerprint = __in.readLong();\n");
        code.push_str("        if (fingerprint != FINGERPRINT) {\n");
        code.push_str("            throw new IOException(\"fingerprint mismatch: expected \" + Long.toHexString(FINGERPRINT) + \", got \" + Long.toHexString(fingerprint));\n");
        code.push_str("        }\n");
        code.push_str("        return _decodeRecursiveFactory(__in);\n");
        code.push_str("    }\n");

        code.push_str(&format!(
            "\n    public static {class} _decodeRecursiveFactory(DataInput __in) throws IOException {{\n"
        ));
        code.push_str(&format!("        {class} __o = new {class}();\n"));
        code.push_str("        __o._decodeRecursive(__in);\n");
        code.push_str("        return __o;\n");
        code.push_str("    }\n");

        code.push_str("\n    public void _decodeRecursive(DataInput __in) throws IOException {\n");
        synthesize(&plan, Phase::Decode, &mut renderer);
        renderer.drain_into(&mut code);
        code.push_str("    }\n");

        // Size
        code.push_str("\n    public int getEncodedSize() {\n");
        code.push_str("        int __size = 0;\n");
        synthesize(&plan, Phase::Size, &mut renderer);
        renderer.drain_into(&mut code);
        code.push_str("        return __size;\n");
        code.push_str("    }\n");

        if has_booleans {
            code.push_str(BOOLEAN_HELPER);
        }
        if has_strings {
            code.push_str(STRING_HELPERS);
        }
        code.push_str("}\n");

        Ok(code)
    }

    fn index_files(&self, _ctx: &EmitContext<'_>) -> Result<Vec<IndexFile>, EmitError> {
        // Java packages are directories; nothing to index
        Ok(Vec::new())
    }

    fn stamp(&self) -> String {
        format!("// lcm-gen {GENERATOR_VERSION} {BACKEND}")
    }
}

const STRING_HELPERS: &str = r#"
    private static void _encodeString(DataOutput __out, String value) throws IOException {
        byte[] bytes = value.getBytes(StandardCharsets.UTF_8);
        __out.writeInt(bytes.length + 1);
        __out.write(bytes);
        __out.writeByte(0);
    }

    private static String _decodeString(DataInput __in) throws IOException {
        int length = __in.readInt();
        if (length < 1) {
            throw new IOException("invalid string length prefix: " + length);
        }
        int remaining = length - 1;
        java.io.ByteArrayOutputStream buffer = new java.io.ByteArrayOutputStream(Math.min(remaining, 4096));
        byte[] chunk = new byte[Math.min(remaining, 4096)];
        while (remaining > 0) {
            int n = Math.min(remaining, chunk.length);
            __in.readFully(chunk, 0, n);
            buffer.write(chunk, 0, n);
            remaining -= n;
        }
        if (__in.readByte() != 0) {
            throw new IOException("expected NUL terminator after string");
        }
        return StandardCharsets.UTF_8.newDecoder()
            .onMalformedInput(java.nio.charset.CodingErrorAction.REPORT)
            .onUnmappableCharacter(java.nio.charset.CodingErrorAction.REPORT)
            .decode(java.nio.ByteBuffer.wrap(buffer.toByteArray()))
            .toString();
    }
"#;

const BOOLEAN_HELPER: &str = r#"
    private static boolean _decodeBoolean(DataInput __in) throws IOException {
        byte value = __in.readByte();
        if (value != 0 && value != 1) {
            throw new IOException("invalid boolean byte: " + value);
        }
        return value == 1;
    }
"#;

/// Renders marshal routine bodies as Java statements
struct JavaMarshal<'r> {
    leaves: &'r HashMap<String, JavaLeaf>,
    lines: Vec<(usize, String)>,
    indent: usize,
    /// Element expression of each open axis
    access: Vec<String>,
    /// Size phase with a fixed-size leaf: axis lengths to multiply
    factors: Vec<String>,
    counting: bool,
}

impl JavaMarshal<'_> {
    fn line(&mut self, text: String) {
        self.lines.push((self.indent, text));
    }

    fn drain_into(&mut self, code: &mut String) {
        for (indent, text) in self.lines.drain(..) {
            code.push_str(&"    ".repeat(indent + 2));
            code.push_str(&text);
            code.push('\n');
        }
        self.indent = 0;
        self.access.clear();
        self.factors.clear();
        self.counting = false;
    }

    fn target(&self) -> String {
        self.access.last().cloned().unwrap_or_default()
    }

    fn open_loop(&mut self, depth: usize, bound: String) {
        let var = index_var(depth);
        let target = self.target();
        self.line(format!("for (int {var} = 0; {var} < {bound}; {var}++) {{"));
        self.indent += 1;
        self.access.push(format!("{target}[{var}]"));
    }

    /// Decode: allocate the array of one axis, `length` elements with the
    /// inner axes left for their own loops
    fn allocate(&mut self, axis: &Axis<'_>, length: &str) {
        let leaves = self.leaves;
        let leaf = leaves.get(axis.member.name()).map(JavaLeaf::name).unwrap_or_default();
        let inner = "[]".repeat(axis.member.dimensions().len() - axis.depth - 1);
        let target = self.target();
        self.line(format!("{target} = new {leaf}[{length}]{inner};"));
    }
}

impl MarshalRenderer for JavaMarshal<'_> {
    fn begin_member(&mut self, phase: Phase, member: &MemberPlan<'_>) {
        let field = member.name();
        self.access = vec![format!("this.{field}")];
        self.factors.clear();
        self.counting = phase == Phase::Size
            && matches!(member.leaf(), Leaf::Primitive(p) if p.encoded_size().is_some());
    }

    fn fixed_array(&mut self, phase: Phase, axis: &Axis<'_>, size: usize) {
        match phase {
            Phase::Size if self.counting => self.factors.push(size.to_string()),
            Phase::Decode => {
                self.allocate(axis, &size.to_string());
                self.open_loop(axis.depth, size.to_string());
            }
            _ => self.open_loop(axis.depth, size.to_string()),
        }
    }

    fn variable_array(&mut self, phase: Phase, axis: &Axis<'_>, size_field: &str) {
        let count = format!("this.{size_field}");
        match phase {
            Phase::Size if self.counting => self.factors.push(count),
            Phase::Encode => {
                let target = self.target();
                let field = axis.member.name();
                self.line(format!(
                    "if ({count} < 0 || {count} > {target}.length) throw new IOException(\"declared count \" + {count} + \" for '{field}' exceeds the \" + {target}.length + \" elements available\");"
                ));
                self.open_loop(axis.depth, count);
            }
            Phase::Decode => {
                // Wire counts: at most Integer.MAX_VALUE, allocated in bounded steps
                let field = axis.member.name();
                self.line(format!(
                    "if ({count} < 0 || {count} > Integer.MAX_VALUE) throw new IOException(\"invalid element count \" + {count} + \" for '{field}'\");"
                ));
                self.allocate(axis, &format!("(int) Math.min({count}, {PREALLOCATION_CAP})"));
                let target = self.target();
                let var = index_var(axis.depth);
                self.open_loop(axis.depth, count.clone());
                self.line(format!(
                    "if ({var} == {target}.length) {target} = java.util.Arrays.copyOf({target}, (int) Math.min(2L * {target}.length, {count}));"
                ));
            }
            _ => self.open_loop(axis.depth, count),
        }
    }

    fn close_array(&mut self, phase: Phase, _axis: &Axis<'_>) {
        if phase == Phase::Size && self.counting {
            return;
        }
        self.indent = self.indent.saturating_sub(1);
        self.access.pop();
        self.line("}".to_string());
    }

    fn primitive(&mut self, phase: Phase, _member: &MemberPlan<'_>, primitive: PrimitiveType, _depth: usize) {
        let Some(jvm) = map_primitive(primitive) else {
            return;
        };
        let target = self.target();
        match phase {
            Phase::Encode => self.line(jvm.write(&target)),
            Phase::Decode => self.line(format!("{target} = {};", jvm.read())),
            Phase::Size if self.counting => {
                let mut terms = vec![jvm.size(&target)];
                terms.extend(self.factors.iter().cloned());
                self.line(format!("__size += {};", terms.join(" * ")));
            }
            Phase::Size => self.line(format!("__size += {};", jvm.size(&target))),
        }
    }

    fn struct_ref(&mut self, phase: Phase, member: &MemberPlan<'_>, _ty: &TypeName, _depth: usize) {
        let target = self.target();
        match phase {
            Phase::Encode => self.line(format!("{target}._encodeRecursive(__out);")),
            Phase::Decode => {
                let leaves = self.leaves;
                let class = leaves.get(member.name()).map(JavaLeaf::name).unwrap_or_default();
                self.line(format!("{target} = {class}._decodeRecursiveFactory(__in);"));
            }
            Phase::Size => self.line(format!("__size += {target}.getEncodedSize();")),
        }
    }
}

#[cfg(test)]
#[path = "java/java_tests.rs"]
mod java_tests;
