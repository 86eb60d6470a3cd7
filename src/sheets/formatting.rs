use datafusion::arrow::datatypes::{DataType, Schema};
use google_sheets4::FieldMask;
use google_sheets4::api::{
    CellData, CellFormat, GridProperties, GridRange, NumberFormat, RepeatCellRequest, Request,
    SheetProperties, TextFormat, UpdateSheetPropertiesRequest,
};

/// Cell format applied to a data column, derived from its Arrow type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Text,
}

impl ColumnFormat {
    pub fn for_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnFormat::Integer,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => ColumnFormat::Decimal,
            DataType::Boolean => ColumnFormat::Boolean,
            DataType::Date32 | DataType::Date64 => ColumnFormat::Date,
            DataType::Timestamp(_, _) => ColumnFormat::DateTime,
            _ => ColumnFormat::Text,
        }
    }

    fn number_format(&self) -> Option<NumberFormat> {
        let (type_, pattern) = match self {
            ColumnFormat::Integer => ("NUMBER", "0"),
            ColumnFormat::Date => ("DATE", "yyyy-mm-dd"),
            ColumnFormat::DateTime => ("DATE_TIME", "yyyy-mm-dd hh:mm:ss"),
            // Any fixed pattern would round the formatted value read back
            ColumnFormat::Decimal | ColumnFormat::Boolean | ColumnFormat::Text => return None,
        };
        Some(NumberFormat {
            type_: Some(type_.to_string()),
            pattern: Some(pattern.to_string()),
        })
    }

    fn horizontal_alignment(&self) -> Option<&'static str> {
        match self {
            ColumnFormat::Integer | ColumnFormat::Decimal => Some("RIGHT"),
            ColumnFormat::Boolean => Some("CENTER"),
            _ => None,
        }
    }
}

/// All formatting requests for a worksheet holding data with `schema`.
pub fn format_requests(sheet_id: i32, schema: &Schema) -> Vec<Request> {
    let mut requests = vec![bold_header_rule(sheet_id), freeze_header_rule(sheet_id)];
    requests.extend(column_format_rules(sheet_id, schema));
    requests
}

/// Make header row bold.
pub(super) fn bold_header_rule(sheet_id: i32) -> Request {
    Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(GridRange {
                sheet_id: Some(sheet_id),
                start_row_index: Some(0),
                end_row_index: Some(1),
                start_column_index: None,
                end_column_index: None,
            }),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    text_format: Some(TextFormat {
                        bold: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["userEnteredFormat.textFormat.bold"])),
        }),
        ..Default::default()
    }
}

/// Freeze header row.
pub(super) fn freeze_header_rule(sheet_id: i32) -> Request {
    Request {
        update_sheet_properties: Some(UpdateSheetPropertiesRequest {
            properties: Some(SheetProperties {
                sheet_id: Some(sheet_id),
                grid_properties: Some(GridProperties {
                    frozen_row_count: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["gridProperties.frozenRowCount"])),
        }),
        ..Default::default()
    }
}

/// Number format and alignment for each typed column, below the header.
pub(super) fn column_format_rules(sheet_id: i32, schema: &Schema) -> Vec<Request> {
    schema
        .fields()
        .iter()
        .enumerate()
        .filter_map(|(index, field)| {
            let format = ColumnFormat::for_type(field.data_type());
            let number_format = format.number_format();
            let alignment = format.horizontal_alignment();

            let mut fields = Vec::new();
            if number_format.is_some() {
                fields.push("userEnteredFormat.numberFormat");
            }
            if alignment.is_some() {
                fields.push("userEnteredFormat.horizontalAlignment");
            }
            if fields.is_empty() {
                return None;
            }

            let column = index as i32;
            Some(Request {
                repeat_cell: Some(RepeatCellRequest {
                    range: Some(GridRange {
                        sheet_id: Some(sheet_id),
                        start_row_index: Some(1), // Skip header row
                        end_row_index: None,
                        start_column_index: Some(column),
                        end_column_index: Some(column + 1),
                    }),
                    cell: Some(CellData {
                        user_entered_format: Some(CellFormat {
                            number_format,
                            horizontal_alignment: alignment.map(str::to_string),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    fields: Some(FieldMask::new(&fields)),
                }),
                ..Default::default()
            })
        })
        .collect()
}
