//! Rust backend.
//!
//! Emits one struct per schema type implementing `Marshal` and `Message`
//! from the runtime crate. Every path in generated code is fully qualified,
//! so artifacts can be mounted as a module tree or pulled in with
//! `include!` without any imports.
//!
//! # Type Mappings
//!
//! | Schema | Rust |
//! |--------|------|
//! | `boolean` | `bool` |
//! | `byte`, `uint8_t` | `u8` |
//! | `int8_t` .. `int64_t` | `i8` .. `i64` |
//! | `float` / `double` | `f32` / `f64` |
//! | `string` | `String` |
//! | `T x[3]` | `[T; 3]` |
//! | `T x[n]` | `Vec<T>` |

use super::{Backend, EmitContext, GENERATOR_VERSION, IndexFile, header, push_comment};
use crate::config::{RustLayout, RustOptions};
use crate::error::EmitError;
use lcm_core::marshal::{Axis, MarshalPlan, MarshalRenderer, MemberPlan, Phase, synthesize};
use lcm_core::naming::{package_to_path, strip_type_suffix, type_name};
use lcm_core::{Constant, Dimension, Member, PrimitiveType, StructDef, TypeName};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

const BACKEND: &str = "rust";

/// File name of the single-file layout
pub const SINGLE_FILE: &str = "lcmtypes.rs";

/// Strict and reserved keywords, all of which need `r#` as identifiers
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Escape a schema identifier for use in Rust source.
///
/// Returns `None` for names Rust cannot express at all.
///
/// # Examples
///
/// ```
/// use lcm_gen::backend::rust::rust_ident;
///
/// assert_eq!(rust_ident("count").as_deref(), Some("count"));
/// assert_eq!(rust_ident("type").as_deref(), Some("r#type"));
/// assert_eq!(rust_ident("self"), None);
/// ```
pub fn rust_ident(name: &str) -> Option<String> {
    if RESERVED.contains(&name) {
        None
    } else if KEYWORDS.contains(&name) {
        Some(format!("r#{name}"))
    } else {
        Some(name.to_string())
    }
}

fn ident(name: &str, item: impl FnOnce() -> String) -> Result<String, EmitError> {
    rust_ident(name).ok_or_else(|| EmitError::Unsupported {
        backend: BACKEND,
        item: item(),
        reason: format!("'{name}' cannot be used as a Rust identifier"),
    })
}

/// Rust spelling of a primitive type
pub fn primitive_type(primitive: PrimitiveType) -> &'static str {
    match primitive {
        PrimitiveType::Boolean => "bool",
        PrimitiveType::Byte | PrimitiveType::UInt8 => "u8",
        PrimitiveType::Int8 => "i8",
        PrimitiveType::Int16 => "i16",
        PrimitiveType::Int32 => "i32",
        PrimitiveType::Int64 => "i64",
        PrimitiveType::UInt16 => "u16",
        PrimitiveType::UInt32 => "u32",
        PrimitiveType::UInt64 => "u64",
        PrimitiveType::Float => "f32",
        PrimitiveType::Double => "f64",
        PrimitiveType::String => "::std::string::String",
    }
}

/// Literal for a constant; floats are re-printed so `1` and `.5` become `1.0` and `0.5`
fn constant_literal(constant: &Constant) -> String {
    let value = constant.value().trim();
    let reprinted = match constant.ty() {
        PrimitiveType::Float => value.parse::<f32>().ok().map(|v| format!("{v:?}")),
        PrimitiveType::Double => value.parse::<f64>().ok().map(|v| format!("{v:?}")),
        _ => None,
    };
    reprinted.unwrap_or_else(|| value.to_string())
}

pub struct RustBackend {
    options: RustOptions,
}

impl RustBackend {
    pub fn new(options: RustOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RustOptions {
        &self.options
    }

    /// Path prefix of the runtime crate
    fn runtime(&self) -> String {
        let runtime = self.options.runtime_crate.trim();
        if runtime.contains("::") {
            runtime.to_string()
        } else {
            format!("::{runtime}")
        }
    }

    fn module_segments(package: &str) -> Result<Vec<String>, EmitError> {
        package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(|segment| ident(segment, || package.to_string()))
            .collect()
    }

    /// Module (and file stem) holding a struct: the short name without `_t`
    fn module_name(def: &StructDef) -> Result<String, EmitError> {
        let stem = strip_type_suffix(def.name().short_name());
        if stem.is_empty() {
            return Err(EmitError::Unsupported {
                backend: BACKEND,
                item: def.name().full_name(),
                reason: "the name is empty once the _t suffix is removed".to_string(),
            });
        }
        ident(stem, || def.name().full_name())
    }

    fn struct_name(ty: &TypeName) -> Result<String, EmitError> {
        let name = type_name(ty.short_name());
        if name.is_empty() {
            return Err(EmitError::Unsupported {
                backend: BACKEND,
                item: ty.full_name(),
                reason: "the name has no letters to form a type name".to_string(),
            });
        }
        ident(&name, || ty.full_name())
    }

    /// Fully qualified path of a generated struct
    fn type_path(&self, ty: &TypeName) -> Result<String, EmitError> {
        let root = self.options.module_root.trim();
        let mut segments = vec![if root.is_empty() { "crate" } else { root }.to_string()];
        segments.extend(Self::module_segments(ty.package())?);
        segments.push(Self::struct_name(ty)?);
        Ok(segments.join("::"))
    }

    fn leaf_type(&self, ty: &TypeName) -> Result<String, EmitError> {
        match ty.primitive() {
            Some(primitive) => Ok(primitive_type(primitive).to_string()),
            None => self.type_path(ty),
        }
    }

    fn member_type(&self, member: &Member) -> Result<String, EmitError> {
        let leaf = self.leaf_type(member.ty())?;
        Ok(member
            .dimensions()
            .iter()
            .rev()
            .fold(leaf, |inner, dim| match dim {
                Dimension::Constant { size } => format!("[{inner}; {size}]"),
                Dimension::Variable { .. } => format!("::std::vec::Vec<{inner}>"),
            }))
    }

    fn default_value(dimensions: &[Dimension]) -> String {
        match dimensions.first() {
            None => "::core::default::Default::default()".to_string(),
            Some(Dimension::Constant { .. }) => format!(
                "::core::array::from_fn(|_| {})",
                Self::default_value(&dimensions[1..])
            ),
            Some(Dimension::Variable { .. }) => "::std::vec::Vec::new()".to_string(),
        }
    }

    /// Struct declaration and impls, without the file header
    fn render_body(&self, def: &StructDef, ctx: &EmitContext<'_>) -> Result<String, EmitError> {
        let plan = MarshalPlan::new(def, ctx.schema)?;
        let name = Self::struct_name(def.name())?;
        let runtime = self.runtime();
        let fingerprint = ctx.fingerprint(def)?;

        let mut fields = HashMap::new();
        for member in def.members() {
            let field = ident(member.name(), || {
                format!("{}.{}", def.name().full_name(), member.name())
            })?;
            fields.insert(member.name(), field);
        }
        let mut paths = HashMap::new();
        for member in def.members() {
            if !member.ty().is_primitive() {
                paths.insert(member.ty(), self.type_path(member.ty())?);
            }
        }

        let mut code = String::new();

        // Struct declaration
        push_comment(&mut code, "", "/// ", def.comment());
        code.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        code.push_str(&format!("pub struct {name} {{\n"));
        for member in def.members() {
            push_comment(&mut code, "    ", "/// ", member.comment());
            code.push_str(&format!(
                "    pub {}: {},\n",
                fields[member.name()],
                self.member_type(member)?
            ));
        }
        code.push_str("}\n");

        // Constants
        if !def.constants().is_empty() {
            code.push_str(&format!("\nimpl {name} {{\n"));
            for constant in def.constants() {
                let const_name = ident(constant.name(), || {
                    format!("{}.{}", def.name().full_name(), constant.name())
                })?;
                push_comment(&mut code, "    ", "/// ", constant.comment());
                code.push_str(&format!(
                    "    pub const {const_name}: {} = {};\n",
                    primitive_type(constant.ty()),
                    constant_literal(constant)
                ));
            }
            code.push_str("}\n");
        }

        // Default
        code.push_str(&format!("\nimpl ::core::default::Default for {name} {{\n"));
        code.push_str("    fn default() -> Self {\n");
        code.push_str("        Self {\n");
        for member in def.members() {
            code.push_str(&format!(
                "            {}: {},\n",
                fields[member.name()],
                Self::default_value(member.dimensions())
            ));
        }
        code.push_str("        }\n");
        code.push_str("    }\n");
        code.push_str("}\n");

        // Marshal
        let mut renderer = RustMarshal {
            runtime: &runtime,
            fields: &fields,
            paths: &paths,
            lines: Vec::new(),
            indent: 0,
            access: Vec::new(),
            expr: String::new(),
        };

        code.push_str(&format!("\nimpl {runtime}::Marshal for {name} {{\n"));

        code.push_str(&format!(
            "    fn encode(&self, __writer: &mut dyn ::std::io::Write) -> ::core::result::Result<(), {runtime}::CodecError> {{\n"
        ));
        synthesize(&plan, Phase::Encode, &mut renderer);
        renderer.drain_into(&mut code);
        code.push_str("        ::core::result::Result::Ok(())\n");
        code.push_str("    }\n\n");

        code.push_str(&format!(
            "    fn decode(__reader: &mut dyn ::std::io::Read) -> ::core::result::Result<Self, {runtime}::CodecError> {{\n"
        ));
        synthesize(&plan, Phase::Decode, &mut renderer);
        renderer.drain_into(&mut code);
        let inits: Vec<String> = def
            .members()
            .iter()
            .map(|m| {
                let field = &fields[m.name()];
                format!("{field}: {}", decoded_local(field))
            })
            .collect();
        if inits.is_empty() {
            code.push_str("        ::core::result::Result::Ok(Self {})\n");
        } else {
            code.push_str(&format!(
                "        ::core::result::Result::Ok(Self {{ {} }})\n",
                inits.join(", ")
            ));
        }
        code.push_str("    }\n\n");

        code.push_str("    fn size(&self) -> usize {\n");
        if plan.is_empty() {
            code.push_str("        0\n");
        } else {
            code.push_str("        let mut size = 0;\n");
            synthesize(&plan, Phase::Size, &mut renderer);
            renderer.drain_into(&mut code);
            code.push_str("        size\n");
        }
        code.push_str("    }\n");
        code.push_str("}\n");

        // Message
        code.push_str(&format!("\nimpl {runtime}::Message for {name} {{\n"));
        code.push_str(&format!("    const FINGERPRINT: u64 = {fingerprint:#018x};\n"));
        code.push_str("}\n");

        Ok(code)
    }

    fn header(&self, def: Option<&StructDef>) -> String {
        header(&self.stamp(), def.and_then(StructDef::source))
    }

    /// Modules per package: child packages and the structs declared in it
    fn module_tree<'d>(ctx: &EmitContext<'d>) -> Result<BTreeMap<Vec<String>, PackageModule<'d>>, EmitError> {
        let mut tree: BTreeMap<Vec<String>, PackageModule<'d>> = BTreeMap::new();
        tree.entry(Vec::new()).or_default();

        for def in ctx.schema.structs() {
            let segments = Self::module_segments(def.name().package())?;
            for depth in 0..segments.len() {
                tree.entry(segments[..depth].to_vec())
                    .or_default()
                    .children
                    .insert(segments[depth].clone());
                tree.entry(segments[..=depth].to_vec()).or_default();
            }
            tree.entry(segments)
                .or_default()
                .structs
                .push((Self::module_name(def)?, Self::struct_name(def.name())?, def));
        }

        for (segments, module) in &tree {
            let mut seen = BTreeSet::new();
            let names = module
                .children
                .iter()
                .chain(module.structs.iter().map(|(m, _, _)| m));
            for name in names {
                if !seen.insert(name) {
                    return Err(EmitError::Unsupported {
                        backend: BACKEND,
                        item: if segments.is_empty() {
                            name.clone()
                        } else {
                            format!("{}::{name}", segments.join("::"))
                        },
                        reason: "two packages or structs map to the same module".to_string(),
                    });
                }
            }
        }
        Ok(tree)
    }

    fn tree_index(&self, ctx: &EmitContext<'_>) -> Result<Vec<IndexFile>, EmitError> {
        let tree = Self::module_tree(ctx)?;
        let mut files = Vec::with_capacity(tree.len());

        for (segments, module) in &tree {
            let mut code = self.header(None);
            code.push('\n');
            for child in &module.children {
                code.push_str(&format!("pub mod {child};\n"));
            }
            for (module_name, struct_name, _) in &module.structs {
                code.push_str(&format!("pub mod {module_name};\n"));
                code.push_str(&format!("pub use self::{module_name}::{struct_name};\n"));
            }

            let dir: PathBuf = segments.iter().map(|s| s.trim_start_matches("r#")).collect();
            files.push(IndexFile {
                path: dir.join("mod.rs"),
                contents: code,
            });
        }
        Ok(files)
    }

    fn single_index(&self, ctx: &EmitContext<'_>) -> Result<Vec<IndexFile>, EmitError> {
        let tree = Self::module_tree(ctx)?;
        let mut code = self.header(None);
        self.render_inline(&tree, &[], 0, ctx, &mut code)?;
        Ok(vec![IndexFile {
            path: PathBuf::from(SINGLE_FILE),
            contents: code,
        }])
    }

    fn render_inline(
        &self,
        tree: &BTreeMap<Vec<String>, PackageModule<'_>>,
        segments: &[String],
        level: usize,
        ctx: &EmitContext<'_>,
        code: &mut String,
    ) -> Result<(), EmitError> {
        let Some(module) = tree.get(segments) else {
            return Ok(());
        };
        let indent = "    ".repeat(level);

        for (_, _, def) in &module.structs {
            code.push('\n');
            if let Some(source) = def.source() {
                code.push_str(&format!("{indent}// Source: {}\n", source.display()));
            }
            for line in self.render_body(def, ctx)?.lines() {
                if line.is_empty() {
                    code.push('\n');
                } else {
                    code.push_str(&format!("{indent}{line}\n"));
                }
            }
        }
        for child in &module.children {
            let mut path = segments.to_vec();
            path.push(child.clone());
            code.push_str(&format!("\n{indent}pub mod {child} {{\n"));
            self.render_inline(tree, &path, level + 1, ctx, code)?;
            code.push_str(&format!("{indent}}}\n"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct PackageModule<'d> {
    children: BTreeSet<String>,
    /// (module name, struct name, definition)
    structs: Vec<(String, String, &'d StructDef)>,
}

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn output_directory(&self) -> &Path {
        &self.options.output
    }

    fn artifact_path(&self, def: &StructDef) -> Option<PathBuf> {
        match self.options.layout {
            RustLayout::Single => None,
            RustLayout::Tree => {
                let stem = strip_type_suffix(def.name().short_name());
                Some(package_to_path(def.name().package()).join(format!("{stem}.rs")))
            }
        }
    }

    fn render_struct(&self, def: &StructDef, ctx: &EmitContext<'_>) -> Result<String, EmitError> {
        let mut code = self.header(Some(def));
        code.push('\n');
        code.push_str(&self.render_body(def, ctx)?);
        Ok(code)
    }

    fn index_files(&self, ctx: &EmitContext<'_>) -> Result<Vec<IndexFile>, EmitError> {
        match self.options.layout {
            RustLayout::Tree => self.tree_index(ctx),
            RustLayout::Single => self.single_index(ctx),
        }
    }

    fn stamp(&self) -> String {
        let layout = match self.options.layout {
            RustLayout::Tree => "tree",
            RustLayout::Single => "single",
        };
        format!(
            "// lcm-gen {GENERATOR_VERSION} {BACKEND} layout={layout} module_root={} runtime={}",
            self.options.module_root.trim(),
            self.runtime(),
        )
    }
}

/// Local holding a member while decoding.
///
/// The prefix keeps member names from shadowing the reader or turning into
/// patterns such as `None`.
fn decoded_local(field: &str) -> String {
    format!("__m_{}", field.trim_start_matches("r#"))
}

/// Renders marshal routine bodies as Rust statements
struct RustMarshal<'r> {
    runtime: &'r str,
    fields: &'r HashMap<&'r str, String>,
    paths: &'r HashMap<&'r TypeName, String>,
    lines: Vec<(usize, String)>,
    indent: usize,
    /// Encode: the element expression of each open axis
    access: Vec<String>,
    /// Decode and size: the expression being built for the current member
    expr: String,
}

impl RustMarshal<'_> {
    fn field<'s>(&'s self, name: &'s str) -> &'s str {
        self.fields.get(name).map(String::as_str).unwrap_or(name)
    }

    fn line(&mut self, text: String) {
        self.lines.push((self.indent, text));
    }

    /// Move rendered statements into a function body at two levels of indent
    fn drain_into(&mut self, code: &mut String) {
        for (indent, text) in self.lines.drain(..) {
            code.push_str(&"    ".repeat(indent + 2));
            code.push_str(&text);
            code.push('\n');
        }
        self.indent = 0;
        self.access.clear();
        self.expr.clear();
    }

    fn leaf(&mut self, phase: Phase, type_expr: &str, depth: usize) {
        let runtime = self.runtime;
        match phase {
            Phase::Encode => {
                let target = match self.access.last() {
                    Some(element) if depth > 0 => element.clone(),
                    _ => format!("&{}", self.access.first().map(String::as_str).unwrap_or("self")),
                };
                self.line(format!("{runtime}::Marshal::encode({target}, __writer)?;"));
            }
            Phase::Decode => {
                self.expr
                    .push_str(&format!("<{type_expr} as {runtime}::Marshal>::decode(__reader)"));
            }
            Phase::Size => {
                if depth == 0 {
                    self.expr = format!("{runtime}::Marshal::size(&{})", self.expr);
                } else {
                    self.expr
                        .push_str(&format!(".map({runtime}::Marshal::size).sum::<usize>()"));
                }
            }
        }
    }
}

impl MarshalRenderer for RustMarshal<'_> {
    fn begin_member(&mut self, phase: Phase, member: &MemberPlan<'_>) {
        let field = self.field(member.name()).to_string();
        match phase {
            Phase::Encode => self.access = vec![format!("self.{field}")],
            Phase::Decode => self.expr = format!("let {} = ", decoded_local(&field)),
            Phase::Size => self.expr = format!("self.{field}"),
        }
    }

    fn fixed_array(&mut self, phase: Phase, axis: &Axis<'_>, size: usize) {
        let runtime = self.runtime;
        match phase {
            Phase::Encode => {
                let source = self.access.last().cloned().unwrap_or_default();
                let var = format!("v{}", axis.depth);
                self.line(format!("for {var} in {source}.iter() {{"));
                self.indent += 1;
                self.access.push(var);
            }
            Phase::Decode => self.expr.push_str(&format!(
                "{runtime}::decode_fixed::<_, _, {size}>(__reader, |__reader| "
            )),
            Phase::Size if axis.depth == 0 => self.expr.push_str(".iter()"),
            Phase::Size => self.expr.push_str(".flat_map(|v| v.iter())"),
        }
    }

    fn variable_array(&mut self, phase: Phase, axis: &Axis<'_>, size_field: &str) {
        let runtime = self.runtime;
        let count = self.field(size_field).to_string();
        let name = axis.member.name();
        match phase {
            Phase::Encode => {
                let source = self.access.last().cloned().unwrap_or_default();
                let var = format!("v{}", axis.depth);
                self.line(format!(
                    "for {var} in {source}.iter().take({runtime}::check_count(\"{name}\", self.{count}, {source}.len())?) {{"
                ));
                self.indent += 1;
                self.access.push(var);
            }
            Phase::Decode => self.expr.push_str(&format!(
                "{runtime}::decode_variable(\"{name}\", {}, __reader, |__reader| ",
                decoded_local(&count)
            )),
            Phase::Size => {
                let take = format!(".take({runtime}::declared_len(self.{count}))");
                if axis.depth == 0 {
                    self.expr.push_str(&format!(".iter(){take}"));
                } else {
                    self.expr.push_str(&format!(".flat_map(|v| v.iter(){take})"));
                }
            }
        }
    }

    fn close_array(&mut self, phase: Phase, _axis: &Axis<'_>) {
        match phase {
            Phase::Encode => {
                self.indent = self.indent.saturating_sub(1);
                self.access.pop();
                self.line("}".to_string());
            }
            Phase::Decode => self.expr.push(')'),
            Phase::Size => {}
        }
    }

    fn primitive(&mut self, phase: Phase, _member: &MemberPlan<'_>, primitive: PrimitiveType, depth: usize) {
        self.leaf(phase, primitive_type(primitive), depth);
    }

    fn struct_ref(&mut self, phase: Phase, _member: &MemberPlan<'_>, ty: &TypeName, depth: usize) {
        let path = self.paths.get(ty).cloned().unwrap_or_else(|| ty.short_name().to_string());
        self.leaf(phase, &path, depth);
    }

    fn end_member(&mut self, phase: Phase, _member: &MemberPlan<'_>) {
        match phase {
            Phase::Encode => self.access.clear(),
            Phase::Decode => {
                let expr = std::mem::take(&mut self.expr);
                self.line(format!("{expr}?;"));
            }
            Phase::Size => {
                let expr = std::mem::take(&mut self.expr);
                self.line(format!("size += {expr};"));
            }
        }
    }
}
