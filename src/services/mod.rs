pub mod archive;
pub mod batch;
pub mod envelope;
pub mod flattener;
pub mod invoice_parser;
pub mod workspace;
pub mod xml_tree;
