use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("unrecognized {kind} '{name}' (expected one of: {expected})")]
    Unrecognized {
        kind: &'static str,
        name: String,
        expected: String,
    },
}

/// Declares a parameter enum whose variants round-trip through their
/// upper-case report names.
macro_rules! parameter_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParamError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParamError::Unrecognized {
                        kind: $kind,
                        name: name.to_string(),
                        expected: [$($text),+].join(", "),
                    }),
                }
            }
        }
    };
}

parameter_enum! {
    /// Keypoint detector families.
    Detector, "detector" {
        ShiTomasi => "SHITOMASI",
        Harris => "HARRIS",
        Fast => "FAST",
        Brisk => "BRISK",
        Orb => "ORB",
        Akaze => "AKAZE",
        Sift => "SIFT",
    }
}

parameter_enum! {
    /// Descriptor extractors.
    Descriptor, "descriptor" {
        Brisk => "BRISK",
        Brief => "BRIEF",
        Orb => "ORB",
        Freak => "FREAK",
        Akaze => "AKAZE",
        Sift => "SIFT",
    }
}

parameter_enum! {
    MatcherKind, "matcher" {
        /// Exhaustive search.
        BruteForce => "MAT_BF",
        /// Approximate nearest neighbours on float descriptors.
        Flann => "MAT_FLANN",
    }
}

parameter_enum! {
    /// Distance family used when comparing descriptors.
    DescriptorKind, "descriptor type" {
        Binary => "DES_BINARY",
        Hog => "DES_HOG",
    }
}

parameter_enum! {
    SelectorKind, "selector" {
        /// Best match per descriptor.
        NearestNeighbour => "SEL_NN",
        /// Two nearest neighbours filtered by the ratio test.
        KNearest => "SEL_KNN",
    }
}

impl DescriptorKind {
    /// Gradient-histogram descriptors are compared with L2, everything else is binary.
    pub fn for_descriptor(descriptor: Descriptor) -> Self {
        match descriptor {
            Descriptor::Sift => DescriptorKind::Hog,
            _ => DescriptorKind::Binary,
        }
    }
}

/// Parses a list of report names, failing on the first unknown one.
pub fn parse_list<T, S>(names: &[S]) -> Result<Vec<T>, ParamError>
where
    T: FromStr<Err = ParamError>,
    S: AsRef<str>,
{
    names.iter().map(|name| name.as_ref().parse()).collect()
}
