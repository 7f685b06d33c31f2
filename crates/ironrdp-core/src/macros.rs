/// Asserts that the traits support dynamic dispatch.
///
/// From <https://docs.rs/static_assertions/1.1.0/src/static_assertions/assert_obj_safe.rs.html#72-76>
#[macro_export]
macro_rules! assert_obj_safe {
    ($($xs:path),+ $(,)?) => {
        $(const _: Option<&dyn $xs> = None;)+
    };
}

/// Asserts that the type implements _all_ of the given traits.
///
/// From <https://docs.rs/static_assertions/1.1.0/src/static_assertions/assert_impl.rs.html#113-121>
#[macro_export]
macro_rules! assert_impl {
    ($type:ty: $($trait:path),+ $(,)?) => {
        const _: fn() = || {
            // Only callable when `$type` implements all traits in `$($trait)+`.
            fn assert_impl_all<T: ?Sized $(+ $trait)+>() {}
            assert_impl_all::<$type>();
        };
    };
}

/// Ensures `$buf` holds at least `size` bytes, otherwise bails out of the enclosing function
/// with a `NotEnoughBytes` error.
#[macro_export]
macro_rules! ensure_size {
    (in: $buf:ident, size: $expected:expr) => {{
        $crate::ensure_size!(ctx: "pdu", in: $buf, size: $expected)
    }};
    (ctx: $name:expr, in: $buf:ident, size: $expected:expr) => {{
        let received = $buf.len();
        let expected = $expected;
        if received < expected {
            return Err($crate::not_enough_bytes_err($name, received, expected));
        }
    }};
}

/// Ensures `$buf` holds at least `Self::FIXED_PART_SIZE` bytes.
#[macro_export]
macro_rules! ensure_fixed_part_size {
    (in: $buf:ident) => {{
        $crate::ensure_size!(ctx: Self::NAME, in: $buf, size: Self::FIXED_PART_SIZE)
    }};
}

/// Casts `$len` into the target integer type, bailing out with an `InvalidField` error
/// (tagged with `$field`) when the value does not fit.
#[macro_export]
macro_rules! cast_length {
    ($field:expr, $len:expr) => {{
        $crate::cast_length!(Self::NAME, $field, $len)
    }};
    ($name:expr, $field:expr, $len:expr) => {{
        ::core::convert::TryFrom::try_from($len).map_err(|_| $crate::invalid_field_err($name, $field, "too many elements"))
    }};
}
