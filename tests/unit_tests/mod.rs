mod equation;
