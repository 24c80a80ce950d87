use mysql::{consts::ColumnType, prelude::FromValue, Row};

pub trait ColumnTypeEx {
    fn is_date_type(&self) -> bool;

    fn is_date_time_type(&self) -> bool;
}

impl ColumnTypeEx for ColumnType {
    fn is_date_type(&self) -> bool {
        matches!(self, ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE)
    }

    fn is_date_time_type(&self) -> bool {
        matches!(
            self,
            ColumnType::MYSQL_TYPE_DATETIME
                | ColumnType::MYSQL_TYPE_DATETIME2
                | ColumnType::MYSQL_TYPE_TIMESTAMP
                | ColumnType::MYSQL_TYPE_TIMESTAMP2
        )
    }
}

pub trait RowEx {
    fn get_secure<T: FromValue>(&self, i: usize) -> Option<T>;
}

impl RowEx for Row {
    fn get_secure<T: FromValue>(&self, i: usize) -> Option<T> {
        self.get_opt(i).and_then(|v| v.ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_temporal_columns() {
        assert!(ColumnType::MYSQL_TYPE_DATE.is_date_type());
        assert!(!ColumnType::MYSQL_TYPE_DATE.is_date_time_type());
        assert!(ColumnType::MYSQL_TYPE_TIMESTAMP.is_date_time_type());
        assert!(!ColumnType::MYSQL_TYPE_VAR_STRING.is_date_type());
    }
}
