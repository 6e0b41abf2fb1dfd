use core::fmt;

use crate::quadtree::NodeRef;

/// Depth-first listing of one layer, one node per line, children in quadrant order.
///
/// ```text
/// depth=0  id=2 {x=[-320, 320) y=[-240, 240) lvl=0} children[-, 1, -, -]
/// depth=1  id=1 (-83, 32)
/// ```
pub struct LayerDump<'a>(pub NodeRef<'a>);

impl fmt::Display for LayerDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut to_process = vec![(self.0, 0)];
        let mut first = true;

        while let Some((node, depth)) = to_process.pop() {
            if !first {
                writeln!(f)?;
            }
            first = false;

            write!(f, "depth={depth}  id={}", node.id())?;

            if let Some(p) = node.point() {
                write!(f, " {p:?}")?;
            }

            if let Some(sq) = node.square() {
                let children = node.children();

                let ids: Vec<String> = children
                    .iter()
                    .map(|c| c.map_or("-".to_string(), |c| c.id().to_string()))
                    .collect();

                write!(f, " {sq} children[{}]", ids.join(", "))?;

                to_process.extend(children.into_iter().rev().flatten().map(|c| (c, depth + 1)));
            }
        }

        Ok(())
    }
}
