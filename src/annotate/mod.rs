pub(crate) mod coco;
pub(crate) mod contours;
pub(crate) mod extract;
