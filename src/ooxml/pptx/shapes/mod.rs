//! Shape trees of slides, slide layouts and slide masters.
//!
//! The object model touches shape content in exactly one place: a new slide
//! receives copies of its layout's placeholders. [`ShapeCollection`] is the
//! read-only view used for that and for inspection.

pub mod base;

pub use base::{BaseShape, PlaceholderFormat, ShapeType};

use crate::common::xml::Element;

/// Placeholder types that are not copied onto new slides.
const UNCLONED_PLACEHOLDERS: [&str; 3] = ["dt", "ftr", "sldNum"];

/// Base names of new placeholder shapes by placeholder type.
static PLACEHOLDER_NAMES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "body" => "Text Placeholder",
    "chart" => "Chart Placeholder",
    "clipArt" => "ClipArt Placeholder",
    "ctrTitle" => "Title",
    "dgm" => "SmartArt Placeholder",
    "dt" => "Date Placeholder",
    "ftr" => "Footer Placeholder",
    "hdr" => "Header Placeholder",
    "media" => "Media Placeholder",
    "obj" => "Content Placeholder",
    "pic" => "Picture Placeholder",
    "sldImg" => "Slide Image Placeholder",
    "sldNum" => "Slide Number Placeholder",
    "subTitle" => "Subtitle",
    "tbl" => "Table Placeholder",
    "title" => "Title",
};

/// Placeholder types whose new shapes get an empty text body.
const TEXT_PLACEHOLDERS: [&str; 5] = ["title", "ctrTitle", "subTitle", "body", "obj"];

/// Shapes of a `p:spTree`, in document order.
#[derive(Debug, Clone, Copy)]
pub struct ShapeCollection<'a> {
    sp_tree: &'a Element,
}

impl<'a> ShapeCollection<'a> {
    pub fn new(sp_tree: &'a Element) -> Self {
        Self { sp_tree }
    }

    /// The `p:spTree` element itself.
    #[inline]
    pub fn sp_tree(&self) -> &'a Element {
        self.sp_tree
    }

    pub fn iter(self) -> impl Iterator<Item = BaseShape<'a>> + 'a {
        self.sp_tree
            .elements()
            .filter_map(|e| ShapeType::from_tag(e.name()).map(|t| BaseShape::new(e, t)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn get(&self, index: usize) -> Option<BaseShape<'a>> {
        self.iter().nth(index)
    }

    pub fn placeholders(self) -> impl Iterator<Item = BaseShape<'a>> + 'a {
        self.iter().filter(BaseShape::is_placeholder)
    }

    /// Largest shape id in the tree, including the tree's own group id.
    pub fn max_shape_id(&self) -> u32 {
        let mut max = 0;
        collect_cnvpr(self.sp_tree, &mut |e: &'a Element| {
            if let Some(id) = e.attr("id").and_then(|id| atoi_simd::parse::<u32>(id.as_bytes()).ok()) {
                max = max.max(id);
            }
        });
        max
    }

    fn names(&self) -> Vec<&'a str> {
        let mut names = Vec::new();
        collect_cnvpr(self.sp_tree, &mut |e: &'a Element| {
            if let Some(name) = e.attr("name") {
                names.push(name);
            }
        });
        names
    }
}

impl<'a> IntoIterator for ShapeCollection<'a> {
    type Item = BaseShape<'a>;
    type IntoIter = Box<dyn Iterator<Item = BaseShape<'a>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Visit every `p:cNvPr` at any depth.
fn collect_cnvpr<'a>(element: &'a Element, visit: &mut dyn FnMut(&'a Element)) {
    for child in element.elements() {
        if child.name() == "p:cNvPr" {
            visit(child);
        }
        collect_cnvpr(child, visit);
    }
}

/// Append copies of the layout's placeholders to a slide's shape tree.
///
/// Date, footer and slide-number placeholders are skipped. Each copy is a
/// fresh `p:sp` with the next unused shape id, a name derived from the
/// placeholder type, the layout's `p:ph` attributes, an empty `p:spPr` and,
/// for text placeholders, an empty text body. Returns the number of shapes
/// added.
pub fn clone_layout_placeholders(sp_tree: &mut Element, layout_sp_tree: &Element) -> usize {
    let layout_shapes = ShapeCollection::new(layout_sp_tree);
    let mut added = 0;

    for shape in layout_shapes.placeholders() {
        let Some(ph) = shape.placeholder() else { continue };
        if UNCLONED_PLACEHOLDERS.contains(&ph.ph_type()) {
            continue;
        }

        let slide_shapes = ShapeCollection::new(sp_tree);
        let id = slide_shapes.max_shape_id() + 1;
        let name = next_placeholder_name(&slide_shapes.names(), ph, id);
        let sp = new_placeholder_sp(ph, id, &name);
        sp_tree.push(sp);
        added += 1;
    }

    added
}

/// `"<Base> <n>"`, starting at `id - 1` and counting up until unused.
fn next_placeholder_name(used: &[&str], ph: PlaceholderFormat<'_>, id: u32) -> String {
    let base = PLACEHOLDER_NAMES.get(ph.ph_type()).copied().unwrap_or("Placeholder");
    let base = if ph.orient() == "vert" {
        format!("Vertical {}", base)
    } else {
        base.to_string()
    };

    let mut num = id.saturating_sub(1);
    loop {
        let name = format!("{} {}", base, num);
        if !used.contains(&name.as_str()) {
            return name;
        }
        num += 1;
    }
}

fn new_placeholder_sp(layout_ph: PlaceholderFormat<'_>, id: u32, name: &str) -> Element {
    let mut ph = Element::new("p:ph");
    for (key, value) in layout_ph.element().attributes() {
        ph.set_attr(key, value);
    }

    let nv_sp_pr = Element::new("p:nvSpPr")
        .with_child(
            Element::new("p:cNvPr")
                .with_attr("id", itoa::Buffer::new().format(id))
                .with_attr("name", name),
        )
        .with_child(Element::new("p:cNvSpPr").with_child(Element::new("a:spLocks").with_attr("noGrp", "1")))
        .with_child(Element::new("p:nvPr").with_child(ph));

    let mut sp = Element::new("p:sp")
        .with_child(nv_sp_pr)
        .with_child(Element::new("p:spPr"));

    if TEXT_PLACEHOLDERS.contains(&layout_ph.ph_type()) {
        sp.push(
            Element::new("p:txBody")
                .with_child(Element::new("a:bodyPr"))
                .with_child(Element::new("a:lstStyle"))
                .with_child(Element::new("a:p")),
        );
    }

    sp
}
