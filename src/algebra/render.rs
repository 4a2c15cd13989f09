//! Fixed-width columnar rendering of relations and tuples

use std::fmt::{Display, Write};

use crate::{
    algebra::schema::{Relation, Tuple},
    config::Config,
};

/// Separates columns in rendered output
pub const COL_SEPARATOR: char = '|';

/// Renders relations as text tables
pub struct Renderer {
    column_width: usize,
}

impl Renderer {
    pub fn new(config: &Config) -> Self {
        Self {
            column_width: config.column_width,
        }
    }

    /// Truncates or pads a cell to the column width
    fn cell(&self, out: &mut String, text: &str) {
        let width = self.column_width;
        let truncated: String = text.chars().take(width).collect();
        let fill = width - truncated.chars().count();
        out.push_str(&truncated);
        out.extend(std::iter::repeat_n(' ', fill));
    }

    fn row<'a>(&self, cells: impl Iterator<Item = &'a str>) -> String {
        let mut out = String::new();
        out.push(COL_SEPARATOR);
        for (i, text) in cells.enumerate() {
            if i > 0 {
                out.push(COL_SEPARATOR);
            }
            self.cell(&mut out, text);
        }
        out.push(COL_SEPARATOR);
        out
    }

    /// `|v1   |v2   |`
    pub fn render_tuple(&self, tuple: &Tuple) -> String {
        let values: Vec<String> = tuple.values().iter().map(|v| v.to_string()).collect();
        self.row(values.iter().map(String::as_str))
    }

    /// Name line, banner, header, banner, tuples (or `(Empty)`), banner
    pub fn render_relation(&self, relation: &Relation) -> String {
        let degree = relation.degree();
        let banner = "-".repeat(degree * self.column_width + degree + 1);

        // Pedantic headers only when short names collide
        let pedantic = relation.has_duplicate_attributes();
        let headers: Vec<String> = relation
            .attributes()
            .iter()
            .map(|a| if pedantic { a.pedantic_name() } else { a.name.clone() })
            .collect();

        let mut out = String::new();
        if let Some(name) = relation.name() {
            out.push_str(name);
            out.push('\n');
        }
        out.push_str(&banner);
        out.push('\n');
        out.push_str(&self.row(headers.iter().map(String::as_str)));
        out.push('\n');
        out.push_str(&banner);
        out.push('\n');
        if relation.is_empty() {
            out.push_str("(Empty)\n");
        } else {
            for tuple in relation.tuples() {
                out.push_str(&self.render_tuple(tuple));
                out.push('\n');
            }
        }
        out.push_str(&banner);
        out.push('\n');
        out
    }

    /// `Name(\n\ta TYPE, \n\tb TYPE\n)`
    pub fn render_schema(&self, relation: &Relation) -> String {
        let mut out = String::new();
        out.push_str(relation.name().unwrap_or_default());
        out.push_str("(\n");
        let attrs = relation.attributes();
        for (i, attr) in attrs.iter().enumerate() {
            // Writing to a String never fails
            let _ = write!(out, "\t{} {}", attr.name, attr.datatype);
            if i < attrs.len() - 1 {
                out.push_str(", ");
            }
            out.push('\n');
        }
        out.push(')');
        out
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Renderer::default().render_relation(self))
    }
}

impl Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Renderer::default().render_tuple(self))
    }
}

#[cfg(test)]
mod tests {
    use super::Renderer;
    use crate::{
        algebra::{
            executor::{Executor, Times},
            schema::{Relation, Tuple},
            types::{DataType, Value},
        },
        config::Config,
        error::Result,
    };

    #[test]
    fn test_render_tuple_truncates_and_pads() {
        let renderer = Renderer::new(&Config {
            column_width: 4,
            ..Default::default()
        });
        let t = Tuple::new(vec![Value::from("Madagascar"), Value::Numeric(7.0)]);
        assert_eq!(renderer.render_tuple(&t), "|Mada|7   |");
    }

    #[test]
    fn test_render_relation() -> Result<()> {
        let renderer = Renderer::new(&Config {
            column_width: 4,
            ..Default::default()
        });
        let mut r = Relation::with_schema("R", &[("a", DataType::Text)]);
        assert_eq!(
            renderer.render_relation(&r),
            "R\n------\n|a   |\n------\n(Empty)\n------\n"
        );

        r.add_tuple(Tuple::new(vec![Value::from("x")]))?;
        assert_eq!(
            renderer.render_relation(&r),
            "R\n------\n|a   |\n------\n|x   |\n------\n"
        );
        Ok(())
    }

    #[test]
    fn test_render_pedantic_headers_on_collision() -> Result<()> {
        let renderer = Renderer::new(&Config {
            column_width: 4,
            ..Default::default()
        });
        let mut r = Relation::with_schema("R", &[("k", DataType::Text)]);
        let mut s = Relation::with_schema("S", &[("k", DataType::Text), ("v", DataType::Text)]);
        r.add_tuple(Tuple::new(vec![Value::from("a")]))?;
        s.add_tuple(Tuple::new(vec![Value::from("b"), Value::from("c")]))?;
        let product = Times::new(&r, &s).execute()?;

        assert_eq!(
            renderer.render_relation(&product),
            "----------------\n|R.k |S.k |S.v |\n----------------\n|a   |b   |c   |\n----------------\n"
        );
        // Without a collision the short names are used
        assert!(renderer.render_relation(&s).contains("|k   |v   |"));
        Ok(())
    }

    #[test]
    fn test_render_schema() {
        let r = Relation::with_schema("R", &[("a", DataType::Text), ("b", DataType::Numeric)]);
        assert_eq!(
            Renderer::default().render_schema(&r),
            "R(\n\ta TEXT, \n\tb NUMERIC\n)"
        );
    }
}
