use tracing::warn;

use crate::{
    algebra::{
        schema::{Attribute, Relation},
        types::DataType,
    },
    error::{Error, Result},
};

/// Parses a schema definition, one `Name(attr TYPE, ...)` declaration per line
///
/// Lines that are not relation declarations are skipped.
pub fn parse(schema: &str) -> Result<Vec<Relation>> {
    let mut relations = Vec::new();
    for (lineno, line) in schema.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_declaration(line)? {
            Some(relation) => relations.push(relation),
            None => warn!(line = lineno + 1, content = line, "skipping schema line"),
        }
    }
    Ok(relations)
}

/// Returns None when the line does not have the `Name(...)` shape
fn parse_declaration(line: &str) -> Result<Option<Relation>> {
    let Some((name, rest)) = line.split_once('(') else {
        return Ok(None);
    };
    let (name, Some(body)) = (name.trim(), rest.strip_suffix(')')) else {
        return Ok(None);
    };
    if name.is_empty() || body.trim().is_empty() {
        return Ok(None);
    }

    let mut attributes = Vec::new();
    for decl in body.split(',') {
        let parts: Vec<&str> = decl.split_whitespace().collect();
        let [attr, datatype] = parts.as_slice() else {
            return Err(Error::Schema(format!(
                "attribute declaration '{}' of relation {} is not 'name TYPE'",
                decl.trim(),
                name
            )));
        };
        let datatype = DataType::from_str(datatype).ok_or_else(|| {
            Error::Schema(format!(
                "unrecognized data type for attribute {}: {}",
                attr, datatype
            ))
        })?;
        attributes.push(Attribute::new(Some(name), datatype, *attr));
    }

    let mut relation = Relation::new(Some(name));
    relation.set_attributes(attributes);
    Ok(Some(relation))
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::{
        algebra::types::DataType,
        error::{Error, Result},
    };

    #[test]
    fn test_parse_declarations() -> Result<()> {
        let relations = parse(
            "Offices(code TEXT, city text)\n\
             -- comment line\n\
             \n\
             Sales( region TEXT ,amount Numeric )\n",
        )?;
        assert_eq!(relations.len(), 2);

        let offices = &relations[0];
        assert_eq!(offices.name(), Some("Offices"));
        assert_eq!(offices.lookup("Offices.city")?, 1);

        let sales = &relations[1];
        assert_eq!(sales.attributes()[1].name, "amount");
        assert_eq!(sales.attributes()[1].datatype, DataType::Numeric);
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("R(a BLOB)"), Err(Error::Schema(_))));
        assert!(matches!(parse("R(a TEXT, b)"), Err(Error::Schema(_))));
        assert!(matches!(parse("R(a TEXT extra)"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_non_declarations_skipped() -> Result<()> {
        assert!(parse("just words\nR()\n(a TEXT)\nR(a TEXT")?.is_empty());
        Ok(())
    }
}
