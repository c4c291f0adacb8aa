use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display(
        "record of at least {size} bytes does not fit in a container of {container_size} bytes"
    ))]
    RecordTooLarge { size: usize, container_size: usize },

    #[snafu(display(
        "field order violation: wrote field {field_no} but schema expects {expected} fields"
    ))]
    FieldOrderViolation { field_no: usize, expected: usize },

    #[snafu(display("unsupported column type for field {field_no}"))]
    UnsupportedColumnType { field_no: usize },

    #[snafu(display("string field is {len} bytes, must be < 65536"))]
    StringTooLong { len: usize },

    #[snafu(display("map key is {len} bytes, must be < 61440"))]
    MapKeyTooLong { len: usize },

    #[snafu(display("map value is {len} bytes, must be < 65536"))]
    MapValueTooLong { len: usize },

    #[snafu(display("schema declares {count} predefined keys, max is 4096"))]
    TooManyPredefinedKeys { count: usize },

    #[snafu(display("no record in progress"))]
    NoActiveRecord,

    #[snafu(display("a record is already in progress"))]
    RecordAlreadyStarted,

    #[snafu(display("not inside an open map"))]
    NotInMap,

    #[snafu(display("already inside an open map"))]
    AlreadyInMap,

    #[snafu(display("record incomplete: wrote {got} of {expected} fields before endRecord"))]
    RecordIncomplete { got: usize, expected: usize },
}
