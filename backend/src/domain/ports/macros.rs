//! Helper macro generating port error enums with snake_case constructors.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum LookupError {
            Missing => "missing",
            Timeout { message: String } => "timed out: {message}",
            Rejected { status: u16 } => "rejected with {status}",
            Upstream { message: String, status: u16 } => "upstream {status}: {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(LookupError::missing(), LookupError::Missing);
        assert_eq!(LookupError::missing().to_string(), "missing");
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(LookupError::timeout("60s").to_string(), "timed out: 60s");
    }

    #[test]
    fn mixed_fields_keep_declared_order() {
        let err = LookupError::upstream("bad gateway", 502_u16);
        assert_eq!(err.to_string(), "upstream 502: bad gateway");
        assert_eq!(LookupError::rejected(403_u16).to_string(), "rejected with 403");
    }
}
