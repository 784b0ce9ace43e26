use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The graph types the model was trained to recognise.
/// Discriminants follow the model's output order, so `GraphType as usize`
/// is the index of the class in the confidence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType
{
    /// Bar graph used appropriately, e.g. for counts or proportions.
    Approp,
    /// Bar graph of continuous data.
    Bar,
    /// Bar graph with the individual data points overlaid.
    Bardot,
    Box,
    Dot,
    /// Flow chart without participant numbers.
    Flowno,
    /// Flow chart with participant numbers.
    Flowyes,
    Hist,
    Other,
    Pie,
    Text,
    Violin,
}

/// Class table in model output order.
pub const CLASSES: [GraphType; GraphType::COUNT] = [
    GraphType::Approp,
    GraphType::Bar,
    GraphType::Bardot,
    GraphType::Box,
    GraphType::Dot,
    GraphType::Flowno,
    GraphType::Flowyes,
    GraphType::Hist,
    GraphType::Other,
    GraphType::Pie,
    GraphType::Text,
    GraphType::Violin,
];

impl GraphType
{
    pub const COUNT: usize = 12;

    pub fn index(self) -> usize
    {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self>
    {
        CLASSES.get(index).copied()
    }

    pub fn as_str(self) -> &'static str
    {
        match self
        {
            GraphType::Approp => "approp",
            GraphType::Bar => "bar",
            GraphType::Bardot => "bardot",
            GraphType::Box => "box",
            GraphType::Dot => "dot",
            GraphType::Flowno => "flowno",
            GraphType::Flowyes => "flowyes",
            GraphType::Hist => "hist",
            GraphType::Other => "other",
            GraphType::Pie => "pie",
            GraphType::Text => "text",
            GraphType::Violin => "violin",
        }
    }
}

impl Display for GraphType
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown graph type: {0:?}")]
pub struct ParseGraphTypeError(pub String);

impl FromStr for GraphType
{
    type Err = ParseGraphTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        CLASSES
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| ParseGraphTypeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests
{
    use rstest::rstest;

    use super::*;

    #[test]
    fn class_table_matches_discriminants()
    {
        for (index, class) in CLASSES.iter().enumerate()
        {
            assert_eq!(class.index(), index);
            assert_eq!(GraphType::from_index(index), Some(*class));
        }
        assert_eq!(GraphType::from_index(GraphType::COUNT), None);
    }

    #[test]
    fn class_table_is_sorted_by_name()
    {
        let names: Vec<&str> = CLASSES.iter().map(|class| class.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[rstest]
    #[case("box", GraphType::Box)]
    #[case("bardot", GraphType::Bardot)]
    #[case("flowyes", GraphType::Flowyes)]
    fn parses_label(#[case] input: &str, #[case] expected: GraphType)
    {
        assert_eq!(input.parse::<GraphType>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn rejects_unknown_label()
    {
        assert_eq!("Box".parse::<GraphType>(), Err(ParseGraphTypeError("Box".to_string())));
    }

    #[test]
    fn serializes_as_lowercase_name()
    {
        let serialized = serde_json::to_string(&GraphType::Violin).unwrap();
        assert_eq!(serialized, "\"violin\"");
        let deserialized: GraphType = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, GraphType::Violin);
    }
}
