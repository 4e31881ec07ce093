//! Bounding box query parameter parsing.

use crate::coord::Extent;

use super::BboxParseError;

/// Parse `"xmin,ymin,xmax,ymax"` into an extent.
///
/// Whitespace around values is allowed. The box must have positive width
/// and height.
pub fn parse_bbox(input: &str) -> Result<Extent, BboxParseError> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(BboxParseError::WrongArity(parts.len()));
    }

    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| BboxParseError::InvalidNumber(part.to_string()))?;
    }

    let [xmin, ymin, xmax, ymax] = values;
    if xmin >= xmax || ymin >= ymax {
        return Err(BboxParseError::Inverted);
    }
    Ok(Extent::new(xmin, ymin, xmax, ymax))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(
            parse_bbox("-10.5, 20,30 ,40.25").unwrap(),
            Extent::new(-10.5, 20.0, 30.0, 40.25)
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(parse_bbox("1,2,3"), Err(BboxParseError::WrongArity(3)));
        assert_eq!(parse_bbox("1,2,3,4,5"), Err(BboxParseError::WrongArity(5)));
        assert_eq!(parse_bbox(""), Err(BboxParseError::WrongArity(1)));
    }

    #[test]
    fn test_bad_numbers() {
        assert_eq!(
            parse_bbox("1,two,3,4"),
            Err(BboxParseError::InvalidNumber("two".to_string()))
        );
        assert_eq!(
            parse_bbox("1,2,inf,4"),
            Err(BboxParseError::InvalidNumber("inf".to_string()))
        );
        assert_eq!(
            parse_bbox("1,,3,4"),
            Err(BboxParseError::InvalidNumber(String::new()))
        );
    }

    #[test]
    fn test_inverted_and_empty() {
        assert_eq!(parse_bbox("3,2,1,4"), Err(BboxParseError::Inverted));
        assert_eq!(parse_bbox("1,4,3,2"), Err(BboxParseError::Inverted));
        assert_eq!(parse_bbox("1,2,1,4"), Err(BboxParseError::Inverted));
    }
}
