// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared by the wsh crates.

/// Give a fieldless enum a fixed label per variant: an `as_str()` method
/// and a `Display` impl that writes it.
///
/// ```ignore
/// wsh_core::simple_display! {
///     JobState {
///         Doing => "doing",
///         Done => "done",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $enum {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Builder-style setters, one rule per field, inside an `impl` block.
///
/// - `set field: Type;` takes the value as-is
/// - `into field: Type;` takes `impl Into<Type>`
/// - `option field: Type;` stores `Some(value.into())` into an `Option<Type>`
///
/// ```ignore
/// impl LocalConfig {
///     wsh_core::setters! {
///         into shell: String;
///         set cancel_grace_ms: u64;
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    () => {};
    (set $field:ident: $ty:ty; $($rest:tt)*) => {
        pub fn $field(mut self, value: $ty) -> Self {
            self.$field = value;
            self
        }
        $crate::setters! { $($rest)* }
    };
    (into $field:ident: $ty:ty; $($rest:tt)*) => {
        pub fn $field(mut self, value: impl Into<$ty>) -> Self {
            self.$field = value.into();
            self
        }
        $crate::setters! { $($rest)* }
    };
    (option $field:ident: $ty:ty; $($rest:tt)*) => {
        pub fn $field(mut self, value: impl Into<$ty>) -> Self {
            self.$field = Some(value.into());
            self
        }
        $crate::setters! { $($rest)* }
    };
}
