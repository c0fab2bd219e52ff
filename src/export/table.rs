use crate::data::model::DataTable;

use super::ExportError;

/// Header row plus one record per row; missing cells are empty.
pub fn to_csv(table: &DataTable) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns().iter().map(|c| c.name.as_str()))?;
    for row in 0..table.len() {
        writer.write_record(table.row(row).map(|v| v.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filters, FilterChoice, FilterSelection};
    use crate::data::loader::read_csv;
    use crate::data::model::{ColumnKind, Value};

    #[test]
    fn writes_header_and_rows() {
        let table = read_csv("a,b\n1,x\n2.5,\n".as_bytes()).unwrap();
        assert_eq!(to_csv(&table).unwrap(), "a,b\n1,x\n2.5,\n");
    }

    #[test]
    fn quotes_fields_that_need_it() {
        let table = read_csv("name,n\n\"Smith, J\",1\n\"say \"\"hi\"\"\",2\n".as_bytes()).unwrap();
        let text = to_csv(&table).unwrap();
        assert_eq!(text, "name,n\n\"Smith, J\",1\n\"say \"\"hi\"\"\",2\n");
    }

    #[test]
    fn filtered_rows_survive_a_round_trip() {
        let table = read_csv(
            "region,units,price,note\n\
             North,1,2.5,first\n\
             South,2,3.25,\n\
             North,3,,\"a, b\"\n\
             East,4,1e3,last\n"
                .as_bytes(),
        )
        .unwrap();
        let mut selection = FilterSelection::new();
        selection.insert("region".into(), FilterChoice::Value("North".into()));
        let filtered = apply_filters(&table, &selection).unwrap();

        let reparsed = read_csv(to_csv(&filtered).unwrap().as_bytes()).unwrap();
        assert_eq!(reparsed, filtered);
    }

    /// Kinds are inferred per file, so a text column whose surviving rows
    /// all look numeric comes back numeric after export.
    #[test]
    fn numeric_looking_text_reparses_as_numbers() {
        let table = read_csv("code,n\n01,1\nx,2\n".as_bytes()).unwrap();
        let mut selection = FilterSelection::new();
        selection.insert("code".into(), FilterChoice::Value("01".into()));
        let filtered = apply_filters(&table, &selection).unwrap();
        let code = filtered.column("code").unwrap();
        assert_eq!(code.kind, ColumnKind::Categorical);
        assert_eq!(code.values, vec![Value::Text("01".into())]);

        let text = to_csv(&filtered).unwrap();
        assert_eq!(text, "code,n\n01,1\n");
        let reparsed = read_csv(text.as_bytes()).unwrap();
        let code = reparsed.column("code").unwrap();
        assert_eq!(code.kind, ColumnKind::Numeric);
        assert_eq!(code.values, vec![Value::Number(1.0)]);
    }

    #[test]
    fn empty_table_keeps_header() {
        let table = read_csv("a,b\n".as_bytes()).unwrap();
        assert_eq!(to_csv(&table).unwrap(), "a,b\n");
    }
}
