pub mod social_graph;
