//! The `enum`s of `nuklear.h`, as closed Rust enums carrying their C values.
//!
//! Each gets a name table for diagnostics, a checked conversion from the raw
//! `unsigned int` native code hands back, and a `Display` of the form
//! `Heading.UP: 0`.

use std::fmt::{self, Formatter, Display};


macro_rules! c_enums {
    ($(
        $(#[$attr:meta])*
        $name:ident {
            $( $variant:ident = $value:expr ),*$(,)?
        }
    )*)=>{
        $(
        $(#[$attr])*
        #[repr(u32)]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $( $variant = $value, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            pub const NAMES: &'static [(&'static str, u32)] = &[
                $( (stringify!($variant), $value), )*
            ];

            pub fn from_raw(raw: u32) -> Option<Self> {
                $name::ALL.iter().copied().find(|v| *v as u32 == raw)
            }

            pub fn raw(self) -> u32 {
                self as u32
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )*
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, "{}.{}: {}", stringify!($name), self.name(), self.raw())
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> u32 {
                v.raw()
            }
        }
        )*
    };
}

c_enums! {
    Heading {
        UP = 0,
        RIGHT = 1,
        DOWN = 2,
        LEFT = 3,
    }

    ButtonBehavior {
        DEFAULT = 0,
        REPEATER = 1,
    }

    Modify {
        FIXED = 0,
        MODIFIABLE = 1,
    }

    Orientation {
        VERTICAL = 0,
        HORIZONTAL = 1,
    }

    CollapseStates {
        MINIMIZED = 0,
        MAXIMIZED = 1,
    }

    ShowStates {
        HIDDEN = 0,
        SHOWN = 1,
    }

    ChartType {
        CHART_LINES = 0,
        CHART_COLUMN = 1,
        CHART_MAX = 2,
    }

    /// Flags; a chart can report both at once as their bitwise or.
    ChartEvent {
        CHART_HOVERING = 0x01,
        CHART_CLICKED = 0x02,
    }

    ColorFormat {
        RGB = 0,
        RGBA = 1,
    }

    PopupType {
        POPUP_STATIC = 0,
        POPUP_DYNAMIC = 1,
    }

    LayoutFormat {
        DYNAMIC = 0,
        STATIC = 1,
    }

    TreeType {
        TREE_NODE = 0,
        TREE_TAB = 1,
    }

    SymbolType {
        SYMBOL_NONE = 0,
        SYMBOL_X = 1,
        SYMBOL_UNDERSCORE = 2,
        SYMBOL_CIRCLE_SOLID = 3,
        SYMBOL_CIRCLE_OUTLINE = 4,
        SYMBOL_RECT_SOLID = 5,
        SYMBOL_RECT_OUTLINE = 6,
        SYMBOL_TRIANGLE_UP = 7,
        SYMBOL_TRIANGLE_DOWN = 8,
        SYMBOL_TRIANGLE_LEFT = 9,
        SYMBOL_TRIANGLE_RIGHT = 10,
        SYMBOL_PLUS = 11,
        SYMBOL_MINUS = 12,
        SYMBOL_MAX = 13,
    }
}


#[test]
fn test_reverse_lookup() {
    assert_eq!(Heading::from_raw(2), Some(Heading::DOWN));
    assert_eq!(Heading::from_raw(4), None);
    assert_eq!(ChartEvent::from_raw(2), Some(ChartEvent::CHART_CLICKED));
    assert_eq!(ChartEvent::from_raw(0), None);
    assert_eq!(SymbolType::from_raw(13), Some(SymbolType::SYMBOL_MAX));
    assert_eq!(SymbolType::SYMBOL_PLUS.name(), "SYMBOL_PLUS");
}

#[test]
fn test_display() {
    assert_eq!(Heading::UP.to_string(), "Heading.UP: 0");
    assert_eq!(TreeType::TREE_TAB.to_string(), "TreeType.TREE_TAB: 1");
}

#[test]
fn test_name_tables_cover_every_variant() {
    assert_eq!(SymbolType::ALL.len(), 14);
    assert_eq!(SymbolType::NAMES.len(), SymbolType::ALL.len());
    for (v, (name, raw)) in Heading::ALL.iter().zip(Heading::NAMES) {
        assert_eq!(v.name(), *name);
        assert_eq!(v.raw(), *raw);
        assert_eq!(u32::from(*v), *raw);
    }
}
