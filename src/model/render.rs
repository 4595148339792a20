//! C#-like text rendering of the program model
//!
//! Stands in for the decompiler's text output: this is what gets sent to the
//! model as code context.

use super::assembly::{Assembly, FieldDef, MethodDef, PropertyDef, TypeDef};

const INDENT: &str = "    ";

pub fn render_assembly(assembly: &Assembly) -> String {
    let mut out = format!("// {}\n", assembly.name);

    let mut current_ns: Option<&str> = None;
    for ty in &assembly.types {
        let ns = ty.namespace.as_str();
        if current_ns != Some(ns) {
            if current_ns.is_some_and(|open| !open.is_empty()) {
                out.push_str("}\n");
            }
            if !ns.is_empty() {
                out.push_str(&format!("\nnamespace {}\n{{\n", ns));
            }
            current_ns = Some(ns);
        }

        let indent = if ns.is_empty() { "" } else { INDENT };
        out.push('\n');
        out.push_str(&indent_block(&render_type(ty), indent));
    }

    if current_ns.is_some_and(|open| !open.is_empty()) {
        out.push_str("}\n");
    }
    out
}

pub fn render_type(ty: &TypeDef) -> String {
    let mut out = match &ty.base_type {
        Some(base) if base != "object" => format!("public class {} : {}\n{{\n", ty.name, base),
        _ => format!("public class {}\n{{\n", ty.name),
    };

    for field in &ty.fields {
        out.push_str(&render_field(field, INDENT));
    }
    for property in &ty.properties {
        out.push_str(&render_property(property, INDENT));
    }
    for (i, method) in ty.methods.iter().enumerate() {
        if i > 0 || !ty.fields.is_empty() || !ty.properties.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_method(method, INDENT));
    }

    out.push_str("}\n");
    out
}

pub fn render_field(field: &FieldDef, indent: &str) -> String {
    format!("{}private {} {};\n", indent, field.field_type, field.name)
}

pub fn render_property(property: &PropertyDef, indent: &str) -> String {
    format!(
        "{}public {} {} {{ get; set; }}\n",
        indent, property.property_type, property.name
    )
}

pub fn render_method(method: &MethodDef, indent: &str) -> String {
    let params = method
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.param_type, p.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = format!(
        "{indent}public {} {}({})\n{indent}{{\n",
        method.return_type, method.name, params
    );
    let body_indent = format!("{indent}{INDENT}");
    for line in method.body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&body_indent);
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(indent);
    out.push_str("}\n");
    out
}

fn indent_block(block: &str, indent: &str) -> String {
    if indent.is_empty() {
        return block.to_string();
    }
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("{indent}{line}\n")
            }
        })
        .collect()
}
